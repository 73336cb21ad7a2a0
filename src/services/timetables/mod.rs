pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::ErrorCode;
use crate::models::timetables::requests::{
    CreateTimetableRequest, TimetableListParams, TimetableSlot, UpdateTimetableRequest,
};
use crate::services::common::{bad_request, check_school_teacher, error_response};
use crate::storage::Storage;
use crate::utils::validate::{validate_day_of_week, validate_required_text, validate_time_range};

pub struct TimetableService {
    storage: Option<Arc<dyn Storage>>,
}

impl TimetableService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn create_entry(
        &self,
        request: &HttpRequest,
        req: CreateTimetableRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_entry(self, request, req).await
    }

    pub async fn list_entries(
        &self,
        request: &HttpRequest,
        query: TimetableListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_entries(self, request, query).await
    }

    pub async fn update_entry(
        &self,
        request: &HttpRequest,
        id: i64,
        update: UpdateTimetableRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_entry(self, request, id, update).await
    }

    pub async fn delete_entry(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        delete::delete_entry(self, request, id).await
    }
}

/// 课时字段校验
pub(crate) fn validate_slot(slot: &TimetableSlot) -> Result<(), String> {
    validate_day_of_week(slot.day_of_week)?;
    if slot.period < 1 {
        return Err("period must be at least 1".to_string());
    }
    validate_time_range(&slot.start_time, &slot.end_time)?;
    validate_required_text(&slot.subject, 100).map_err(|e| format!("subject: {e}"))?;
    Ok(())
}

fn slot_conflict(message: &str) -> HttpResponse {
    HttpResponse::Conflict().json(crate::models::ApiResponse::error_empty(
        ErrorCode::TimetableConflict,
        message,
    ))
}

/// 写入前的完整检查：字段、教师归属与教师时段冲突
pub(crate) async fn check_slot(
    storage: &Arc<dyn Storage>,
    slot: &TimetableSlot,
    exclude_id: Option<i64>,
) -> Result<(), HttpResponse> {
    if let Err(msg) = validate_slot(slot) {
        return Err(bad_request(ErrorCode::ValidationFailed, msg));
    }
    let Some(teacher_id) = slot.teacher_id else {
        return Ok(());
    };
    check_school_teacher(storage, slot.school_id, teacher_id, "teacher_id").await?;
    match storage
        .teacher_slot_taken(teacher_id, slot.day_of_week, slot.period, exclude_id)
        .await
    {
        Ok(true) => Err(slot_conflict("Teacher is already booked for this day and period")),
        Ok(false) => Ok(()),
        Err(e) => Err(error_response(&e)),
    }
}

/// 同一班级同一时段只能有一条
pub(crate) fn class_slot_conflict() -> HttpResponse {
    slot_conflict("Class already has an entry for this day and period")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> TimetableSlot {
        TimetableSlot {
            school_id: 1,
            class_id: 2,
            teacher_id: None,
            subject: "math".to_string(),
            day_of_week: 1,
            period: 1,
            start_time: "08:00".to_string(),
            end_time: "08:45".to_string(),
            room: None,
        }
    }

    #[test]
    fn test_validate_slot() {
        assert!(validate_slot(&slot()).is_ok());

        let mut bad = slot();
        bad.day_of_week = 8;
        assert!(validate_slot(&bad).is_err());

        let mut bad = slot();
        bad.period = 0;
        assert!(validate_slot(&bad).is_err());

        let mut bad = slot();
        bad.end_time = "07:59".to_string();
        assert!(validate_slot(&bad).is_err());

        let mut bad = slot();
        bad.start_time = "8:00".to_string();
        assert!(validate_slot(&bad).is_err());
    }
}
