use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{NotificationService, owned_notification};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, error_response, not_found};

pub async fn delete_notification(
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

    match storage.delete_notification(notification_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Notification deleted"))),
        Ok(false) => Ok(not_found(ErrorCode::NotificationNotFound, "Notification not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
