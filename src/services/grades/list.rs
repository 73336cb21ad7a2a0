use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::GradeService;
use crate::models::{ApiResponse, grades::requests::GradeListParams};
use crate::services::common::{current_user, error_response, resolve_school};

pub async fn list_grades(
    service: &GradeService,
    request: &HttpRequest,
    mut query: GradeListParams,
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

    // 学生只能看到自己的成绩
    if current.is_student() {
        query.student_id = Some(current.id);
    }

    match storage
        .list_grades_with_pagination(Some(school_id), query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}
