use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ClassService, visible_class};
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::common::{audit, current_user, error_response, not_found};

/// 删除班级，学生保留但不再归属该班
pub async fn delete_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let class = match visible_class(&storage, &current, class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => return Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(resp) => return Ok(resp),
    };

    match storage.delete_class(class_id).await {
        Ok(true) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("class.delete", "class")
                    .school(Some(class.school_id))
                    .actor(current.id, current.school_id)
                    .target(class_id)
                    .details(serde_json::json!({ "name": class.name })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Class deleted")))
        }
        Ok(false) => Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
