use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TimetableService;
use crate::models::{
    ApiResponse,
    timetables::{requests::TimetableListParams, responses::TimetableListResponse},
};
use crate::services::common::{current_user, error_response, resolve_school};

pub async fn list_entries(
    service: &TimetableService,
    request: &HttpRequest,
    mut query: TimetableListParams,
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

    // 学生未指定班级时默认查看本班
    if current.is_student() && query.class_id.is_none() && query.teacher_id.is_none() {
        query.class_id = current.class_id;
        if query.class_id.is_none() {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(
                TimetableListResponse { items: Vec::new() },
                "OK",
            )));
        }
    }

    match storage.list_timetable_entries(Some(school_id), query).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            TimetableListResponse { items },
            "OK",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
