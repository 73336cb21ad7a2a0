use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AssignmentService, can_edit, load_visible};
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{entities::AssignmentStatus, responses::AssignmentResponse},
    audit::entities::NewAuditLog,
    notifications::entities::{NewNotification, NotificationType},
};
use crate::services::common::{
    audit, bad_request, current_user, error_response, forbidden, not_found, notify,
};

/// 推进作业状态：发布（draft → active）或关闭（active → closed）
pub async fn transition(
    service: &AssignmentService,
    request: &HttpRequest,
    id: i64,
    next: AssignmentStatus,
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
        return Ok(forbidden("Only the author or an admin can change this assignment"));
    }
    if !assignment.status.can_transition_to(next) {
        return Ok(bad_request(
            ErrorCode::InvalidStatusTransition,
            format!("Cannot move assignment from {} to {}", assignment.status, next),
        ));
    }

    let updated = match storage.set_assignment_status(id, next).await {
        Ok(Some(a)) => a,
        Ok(None) => return Ok(not_found(ErrorCode::AssignmentNotFound, "Assignment not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    if next == AssignmentStatus::Active {
        match storage.list_class_students(updated.class_id).await {
            Ok(students) => {
                let notifications = students
                    .iter()
                    .filter(|s| s.is_active)
                    .map(|s| {
                        NewNotification::new(
                            s.id,
                            NotificationType::Assignment,
                            format!("New assignment: {}", updated.title),
                        )
                        .with_content(updated.subject.clone())
                        .with_reference("assignment", updated.id)
                    })
                    .collect();
                notify(&storage, notifications).await;
            }
            Err(e) => tracing::warn!("Failed to load students of class {}: {}", updated.class_id, e),
        }
    }

    info!("Assignment {} moved to {} by {}", id, next, current.id);
    let action = match next {
        AssignmentStatus::Active => "assignment.publish",
        _ => "assignment.close",
    };
    audit(
        &storage,
        request,
        NewAuditLog::new(action, "assignment")
            .actor(current.id, current.school_id)
            .target(id),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AssignmentResponse {
            assignment: updated,
        },
        "Assignment status updated",
    )))
}
