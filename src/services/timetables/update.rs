use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{TimetableService, check_slot, class_slot_conflict};
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    timetables::{
        entities::TimetableEntry,
        requests::{TimetableSlot, UpdateTimetableRequest},
        responses::TimetableEntryResponse,
    },
};
use crate::services::common::{audit, current_user, error_response, not_found};

/// 把更新字段合并到现有条目上
fn merge(entry: TimetableEntry, update: UpdateTimetableRequest) -> TimetableSlot {
    TimetableSlot {
        school_id: entry.school_id,
        class_id: entry.class_id,
        teacher_id: update.teacher_id.or(entry.teacher_id),
        subject: update
            .subject
            .map(|s| s.trim().to_string())
            .unwrap_or(entry.subject),
        day_of_week: update.day_of_week.unwrap_or(entry.day_of_week),
        period: update.period.unwrap_or(entry.period),
        start_time: update.start_time.unwrap_or(entry.start_time),
        end_time: update.end_time.unwrap_or(entry.end_time),
        room: update.room.or(entry.room),
    }
}

pub async fn update_entry(
    service: &TimetableService,
    request: &HttpRequest,
    id: i64,
    update: UpdateTimetableRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let entry = match storage.get_timetable_entry(id).await {
        Ok(Some(entry)) if current.can_access_school(entry.school_id) => entry,
        Ok(_) => return Ok(not_found(ErrorCode::TimetableNotFound, "Timetable entry not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    let slot = merge(entry, update);
    if let Err(resp) = check_slot(&storage, &slot, Some(id)).await {
        return Ok(resp);
    }

    match storage.update_timetable_entry(id, slot).await {
        Ok(Some(entry)) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("timetable.update", "timetable")
                    .actor(current.id, current.school_id)
                    .target(id),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                TimetableEntryResponse { entry },
                "Timetable entry updated",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::TimetableNotFound, "Timetable entry not found")),
        Err(SchoolHubError::Conflict(_)) => Ok(class_slot_conflict()),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let now = chrono::Utc::now();
        let entry = TimetableEntry {
            id: 1,
            school_id: 1,
            class_id: 2,
            teacher_id: Some(3),
            subject: "math".to_string(),
            day_of_week: 1,
            period: 2,
            start_time: "09:00".to_string(),
            end_time: "09:45".to_string(),
            room: Some("B12".to_string()),
            created_at: now,
            updated_at: now,
        };
        let slot = merge(
            entry,
            UpdateTimetableRequest {
                period: Some(3),
                subject: Some(" physics ".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(slot.period, 3);
        assert_eq!(slot.subject, "physics");
        assert_eq!(slot.teacher_id, Some(3));
        assert_eq!(slot.room.as_deref(), Some("B12"));
        assert_eq!(slot.start_time, "09:00");
    }
}
