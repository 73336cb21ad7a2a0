use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{GradeService, school_student};
use crate::models::{
    ApiResponse, ErrorCode,
    grades::{entities::GradeSummary, requests::GradeSummaryParams, responses::GradeSummaryResponse},
};
use crate::services::common::{bad_request, current_user, error_response, forbidden};

/// 学生成绩汇总：各科平均与 GPA
pub async fn grade_summary(
    service: &GradeService,
    request: &HttpRequest,
    query: GradeSummaryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let student_id = if current.is_student() {
        match query.student_id {
            Some(id) if id != current.id => {
                return Ok(forbidden("Students can only view their own grades"));
            }
            _ => current.id,
        }
    } else {
        let Some(id) = query.student_id else {
            return Ok(bad_request(ErrorCode::ValidationFailed, "student_id is required"));
        };
        if let Err(resp) = school_student(&storage, &current, id).await {
            return Ok(resp);
        }
        id
    };

    let term = query.term.filter(|t| !t.trim().is_empty());
    match storage.list_student_grades(student_id, term.as_deref()).await {
        Ok(grades) => {
            let summary = GradeSummary::from_grades(student_id, term, &grades);
            Ok(HttpResponse::Ok().json(ApiResponse::success(GradeSummaryResponse { summary }, "OK")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
