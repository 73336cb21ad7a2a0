use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{GradeService, school_grade};
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::common::{audit, current_user, error_response, not_found};

pub async fn delete_grade(
    service: &GradeService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let grade = match school_grade(&storage, &current, id).await {
        Ok(grade) => grade,
        Err(resp) => return Ok(resp),
    };

    match storage.delete_grade(id).await {
        Ok(true) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("grade.delete", "grade")
                    .actor(current.id, current.school_id)
                    .target(id)
                    .details(serde_json::json!({ "student_id": grade.student_id })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Grade deleted")))
        }
        Ok(false) => Ok(not_found(ErrorCode::GradeNotFound, "Grade not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
