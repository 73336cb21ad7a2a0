use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, load_visible};
use crate::models::{ApiResponse, assignments::responses::AssignmentResponse};
use crate::services::common::current_user;

pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match load_visible(&storage, &current, id).await {
        Ok(assignment) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AssignmentResponse { assignment },
            "OK",
        ))),
        Err(resp) => Ok(resp),
    }
}
