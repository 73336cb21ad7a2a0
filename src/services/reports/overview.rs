use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ReportParams, ReportService};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, error_response, not_found, resolve_school};

pub async fn overview(
    service: &ReportService,
    request: &HttpRequest,
    params: ReportParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, params.school_id) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match storage.get_school_by_id(school_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "School not found")),
        Err(e) => return Ok(error_response(&e)),
    }

    match storage.report_overview(school_id).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}
