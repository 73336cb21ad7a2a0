use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SchoolService;
use crate::models::{ApiResponse, ErrorCode, schools::responses::SchoolDetailResponse};
use crate::services::common::{error_response, not_found};

/// 学校详情附带人数统计
pub async fn get_school(
    service: &SchoolService,
    request: &HttpRequest,
    school_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let school = match storage.get_school_by_id(school_id).await {
        Ok(Some(school)) => school,
        Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "School not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    match storage.get_school_stats(school_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            SchoolDetailResponse { school, stats },
            "OK",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
