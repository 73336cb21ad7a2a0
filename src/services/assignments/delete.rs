use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, can_edit, load_visible};
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::common::{audit, current_user, error_response, forbidden, not_found};

/// 删除作业及其关联成绩
pub async fn delete_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    id: i64,
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
        return Ok(forbidden("Only the author or an admin can delete this assignment"));
    }

    match storage.delete_assignment(id).await {
        Ok(true) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("assignment.delete", "assignment")
                    .actor(current.id, current.school_id)
                    .target(id)
                    .details(serde_json::json!({ "title": assignment.title })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Assignment deleted")))
        }
        Ok(false) => Ok(not_found(ErrorCode::AssignmentNotFound, "Assignment not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
