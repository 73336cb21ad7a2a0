use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{UserService, can_manage};
use crate::models::{ApiResponse, ErrorCode, users::responses::UserResponse};
use crate::services::common::{current_user, error_response, not_found};

pub async fn get_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.get_user_detail(user_id).await {
        // 其他学校的用户按不存在处理
        Ok(Some(user)) if can_manage(&current, &user.user) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse { user }, "OK")))
        }
        Ok(_) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
