use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::create::{check_attachment, validate_max_score};
use super::{AssignmentService, can_edit, load_visible};
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{
        entities::AssignmentStatus, requests::UpdateAssignmentRequest,
        responses::AssignmentResponse,
    },
    audit::entities::NewAuditLog,
};
use crate::services::common::{
    audit, bad_request, current_user, error_response, forbidden, not_found,
};
use crate::utils::validate::validate_required_text;

pub async fn update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    id: i64,
    mut update: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let assignment = match load_visible(&storage, &current, id).await {
        Ok(a) => a,
        Err(resp) => return Ok(resp),
    };
    if !can_edit(&current, &assignment) {
        return Ok(forbidden("Only the author or an admin can edit this assignment"));
    }
    if assignment.status == AssignmentStatus::Closed {
        return Ok(bad_request(
            ErrorCode::InvalidStatusTransition,
            "Closed assignments cannot be edited",
        ));
    }

    if let Some(title) = &update.title {
        if let Err(msg) = validate_required_text(title, 200) {
            return Ok(bad_request(ErrorCode::ValidationFailed, format!("title: {msg}")));
        }
        update.title = Some(title.trim().to_string());
    }
    if let Some(subject) = &update.subject {
        if let Err(msg) = validate_required_text(subject, 100) {
            return Ok(bad_request(ErrorCode::ValidationFailed, format!("subject: {msg}")));
        }
        update.subject = Some(subject.trim().to_string());
    }
    if let Some(max_score) = update.max_score
        && let Err(msg) = validate_max_score(max_score)
    {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    if let Some(token) = &update.attachment_token
        && let Err(resp) = check_attachment(storage.as_ref(), token).await
    {
        return Ok(resp);
    }

    match storage.update_assignment(id, update).await {
        Ok(Some(assignment)) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("assignment.update", "assignment")
                    .actor(current.id, current.school_id)
                    .target(id),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                AssignmentResponse { assignment },
                "Assignment updated",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::AssignmentNotFound, "Assignment not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
