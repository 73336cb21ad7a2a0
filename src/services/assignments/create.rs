use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{
        requests::{CreateAssignmentRequest, NewAssignment},
        responses::AssignmentResponse,
    },
    audit::entities::NewAuditLog,
};
use crate::services::common::{
    audit, bad_request, class_in_school, current_user, error_response, resolve_school,
};
use crate::storage::Storage;
use crate::utils::validate::validate_required_text;

pub(super) const DEFAULT_MAX_SCORE: f64 = 100.0;

pub(super) fn validate_max_score(max_score: f64) -> Result<(), &'static str> {
    if !max_score.is_finite() || max_score <= 0.0 {
        return Err("max_score must be greater than 0");
    }
    Ok(())
}

/// 附件令牌须对应已上传的文件
pub(super) async fn check_attachment(
    storage: &dyn Storage,
    token: &str,
) -> Result<(), HttpResponse> {
    match storage.get_file_by_token(token).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(bad_request(ErrorCode::FileNotFound, "Attachment not found")),
        Err(e) => Err(error_response(&e)),
    }
}

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    req: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, None) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = validate_required_text(&req.title, 200) {
        return Ok(bad_request(ErrorCode::ValidationFailed, format!("title: {msg}")));
    }
    if let Err(msg) = validate_required_text(&req.subject, 100) {
        return Ok(bad_request(ErrorCode::ValidationFailed, format!("subject: {msg}")));
    }
    let max_score = req.max_score.unwrap_or(DEFAULT_MAX_SCORE);
    if let Err(msg) = validate_max_score(max_score) {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    if let Err(resp) = class_in_school(&storage, req.class_id, school_id).await {
        return Ok(resp);
    }
    if let Some(token) = &req.attachment_token
        && let Err(resp) = check_attachment(storage.as_ref(), token).await
    {
        return Ok(resp);
    }

    let new_assignment = NewAssignment {
        school_id,
        class_id: req.class_id,
        teacher_id: current.id,
        subject: req.subject.trim().to_string(),
        title: req.title.trim().to_string(),
        description: req.description,
        attachment_token: req.attachment_token,
        max_score,
        due_date: req.due_date.map(|d| d.timestamp()),
    };

    match storage.create_assignment(new_assignment).await {
        Ok(assignment) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("assignment.create", "assignment")
                    .actor(current.id, current.school_id)
                    .target(assignment.id),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                AssignmentResponse { assignment },
                "Assignment created",
            )))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
