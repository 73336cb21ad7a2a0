use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MessageService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, error_response, not_found};

pub async fn mark_read(
    service: &MessageService,
    request: &HttpRequest,
    message_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 只有收件人可以标记已读
    match storage.get_message_by_id(message_id).await {
        Ok(Some(m)) if m.recipient_id == current.id && !m.recipient_deleted => {}
        Ok(_) => return Ok(not_found(ErrorCode::MessageNotFound, "Message not found")),
        Err(e) => return Ok(error_response(&e)),
    }

    match storage.mark_message_read(message_id).await {
        Ok(_) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Message marked as read"))),
        Err(e) => Ok(error_response(&e)),
    }
}
