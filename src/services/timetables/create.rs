use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{TimetableService, check_slot, class_slot_conflict};
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse,
    audit::entities::NewAuditLog,
    timetables::{
        requests::{CreateTimetableRequest, TimetableSlot},
        responses::TimetableEntryResponse,
    },
};
use crate::services::common::{
    audit, class_in_school, current_user, error_response, resolve_school,
};

pub async fn create_entry(
    service: &TimetableService,
    request: &HttpRequest,
    req: CreateTimetableRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, None) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(resp) = class_in_school(&storage, req.class_id, school_id).await {
        return Ok(resp);
    }

    let slot = TimetableSlot {
        school_id,
        class_id: req.class_id,
        teacher_id: req.teacher_id,
        subject: req.subject.trim().to_string(),
        day_of_week: req.day_of_week,
        period: req.period,
        start_time: req.start_time,
        end_time: req.end_time,
        room: req.room,
    };
    if let Err(resp) = check_slot(&storage, &slot, None).await {
        return Ok(resp);
    }

    match storage.create_timetable_entry(slot).await {
        Ok(entry) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("timetable.create", "timetable")
                    .actor(current.id, current.school_id)
                    .target(entry.id),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                TimetableEntryResponse { entry },
                "Timetable entry created",
            )))
        }
        Err(SchoolHubError::Conflict(_)) => Ok(class_slot_conflict()),
        Err(e) => Ok(error_response(&e)),
    }
}
