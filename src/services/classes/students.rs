use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ClassService, visible_class};
use crate::models::{ApiResponse, ErrorCode, classes::responses::ClassStudentsResponse};
use crate::services::common::{current_user, error_response, not_found};

pub async fn list_class_students(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match visible_class(&storage, &current, class_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(resp) => return Ok(resp),
    }

    match storage.list_class_students(class_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassStudentsResponse { class_id, items },
            "OK",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
