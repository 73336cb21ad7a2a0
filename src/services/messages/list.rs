use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MessageService;
use crate::models::{
    ApiResponse,
    messages::{entities::Mailbox, requests::MessageListParams},
};
use crate::services::common::{current_user, error_response};

pub async fn list_messages(
    service: &MessageService,
    request: &HttpRequest,
    mailbox: Mailbox,
    query: MessageListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage
        .list_messages_with_pagination(current.id, mailbox, query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}
