use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::warn;

use super::MessageService;
use crate::models::{ApiResponse, ErrorCode, messages::responses::MessageResponse};
use crate::services::common::{current_user, error_response, not_found};

/// 查看消息；收件人打开时标记为已读
pub async fn get_message(
    service: &MessageService,
    request: &HttpRequest,
    message_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let mut message = match storage.get_message_by_id(message_id).await {
        Ok(Some(m)) if m.sender_id == current.id && !m.sender_deleted => m,
        Ok(Some(m)) if m.recipient_id == current.id && !m.recipient_deleted => m,
        Ok(_) => return Ok(not_found(ErrorCode::MessageNotFound, "Message not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    if message.recipient_id == current.id && !message.is_read {
        match storage.mark_message_read(message_id).await {
            Ok(_) => {
                message.is_read = true;
                message.read_at = Some(chrono::Utc::now());
            }
            Err(e) => warn!("Failed to mark message {} read: {}", message_id, e),
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(MessageResponse { message }, "OK")))
}
