use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MessageService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, error_response, not_found};

/// 从自己的信箱中删除，双方都删除后记录才会移除
pub async fn delete_message(
    service: &MessageService,
    request: &HttpRequest,
    message_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.delete_message_for_user(message_id, current.id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Message deleted"))),
        Ok(false) => Ok(not_found(ErrorCode::MessageNotFound, "Message not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
