use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{MessageService, can_message};
use crate::models::{
    ApiResponse, ErrorCode,
    messages::{requests::SendMessageRequest, responses::MessageResponse},
    notifications::entities::{NewNotification, NotificationType},
};
use crate::services::common::{bad_request, current_user, error_response, notify};
use crate::utils::validate::validate_required_text;

pub async fn send_message(
    service: &MessageService,
    request: &HttpRequest,
    mut message: SendMessageRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = validate_required_text(&message.subject, 200) {
        return Ok(bad_request(ErrorCode::ValidationFailed, format!("subject: {msg}")));
    }
    if let Err(msg) = validate_required_text(&message.body, 10_000) {
        return Ok(bad_request(ErrorCode::ValidationFailed, format!("body: {msg}")));
    }
    message.subject = message.subject.trim().to_string();

    let recipient = match storage.get_user_by_id(message.recipient_id).await {
        Ok(Some(user)) if can_message(&current, &user) => user,
        Ok(_) => {
            return Ok(bad_request(
                ErrorCode::RecipientInvalid,
                "Recipient does not exist or cannot receive messages from you",
            ));
        }
        Err(e) => return Ok(error_response(&e)),
    };

    // 总管理员发出的消息归属收件人学校
    let school_id = current.school_id.or(recipient.school_id);

    match storage.create_message(school_id, current.id, message).await {
        Ok(message) => {
            notify(
                &storage,
                vec![
                    NewNotification::new(
                        recipient.id,
                        NotificationType::Message,
                        format!("New message from {}", current.full_name),
                    )
                    .with_content(message.subject.clone())
                    .with_reference("message", message.id),
                ],
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                MessageResponse { message },
                "Message sent",
            )))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
