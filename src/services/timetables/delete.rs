use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TimetableService;
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::common::{audit, current_user, error_response, not_found};

pub async fn delete_entry(
    service: &TimetableService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.get_timetable_entry(id).await {
        Ok(Some(entry)) if current.can_access_school(entry.school_id) => {}
        Ok(_) => return Ok(not_found(ErrorCode::TimetableNotFound, "Timetable entry not found")),
        Err(e) => return Ok(error_response(&e)),
    }

    match storage.delete_timetable_entry(id).await {
        Ok(true) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("timetable.delete", "timetable")
                    .actor(current.id, current.school_id)
                    .target(id),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Timetable entry deleted")))
        }
        Ok(false) => Ok(not_found(ErrorCode::TimetableNotFound, "Timetable entry not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
