use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{NotificationService, owned_notification};
use crate::models::{ApiResponse, notifications::responses::MarkAllReadResponse};
use crate::services::common::{current_user, error_response};

pub async fn mark_as_read(
    service: &NotificationService,
    request: &HttpRequest,
    notification_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if let Err(resp) = owned_notification(&storage, &current, notification_id).await {
        return Ok(resp);
    }

    match storage.mark_notification_read(notification_id).await {
        Ok(_) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Notification marked as read"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn mark_all_as_read(
    service: &NotificationService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.mark_all_notifications_read(current.id).await {
        Ok(marked_count) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            MarkAllReadResponse { marked_count },
            "All notifications marked as read",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
