use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ClassService, visible_class};
use crate::models::{ApiResponse, ErrorCode, classes::responses::ClassResponse};
use crate::services::common::{current_user, not_found};

pub async fn get_class(
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
        Ok(Some(class)) => Ok(HttpResponse::Ok().json(ApiResponse::success(ClassResponse { class }, "OK"))),
        Ok(None) => Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(resp) => Ok(resp),
    }
}
