use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::path::Path;
use tracing::info;

use super::{UserService, can_manage};
use crate::config::AppConfig;
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog, users::entities::UserRole,
};
use crate::services::common::{
    audit, bad_request, current_user, error_response, not_found, revoke_sessions,
};
use crate::services::files::remove_stored_files;

pub async fn delete_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if user_id == current.id {
        return Ok(bad_request(
            ErrorCode::CannotDeleteSelf,
            "You cannot delete your own account",
        ));
    }

    let target = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if can_manage(&current, &user) => user,
        Ok(_) => return Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    // 先行检查最后一个管理员，避免注销后删除失败
    if target.role == UserRole::Admin
        && target.is_active
        && let Some(school_id) = target.school_id
    {
        match storage.count_active_admins(school_id).await {
            Ok(count) if count <= 1 => {
                return Ok(bad_request(
                    ErrorCode::LastAdmin,
                    "Cannot delete the last active admin of a school",
                ));
            }
            Ok(_) => {}
            Err(e) => return Ok(error_response(&e)),
        }
    }

    // 会话行会随用户删除，需先取出令牌清理缓存
    revoke_sessions(&storage, request, user_id).await;

    match storage.delete_user(user_id).await {
        Ok(Some(stored_files)) => {
            info!("User {} deleted by {}", user_id, current.id);
            remove_stored_files(Path::new(&AppConfig::get().upload.dir), &stored_files).await;
            audit(
                &storage,
                request,
                NewAuditLog::new("user.delete", "user")
                    .school(target.school_id)
                    .actor(current.id, current.school_id)
                    .target(user_id)
                    .details(serde_json::json!({ "email": target.email, "role": target.role })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted")))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(SchoolHubError::Validation(msg)) => Ok(bad_request(ErrorCode::LastAdmin, msg)),
        Err(e) => Ok(error_response(&e)),
    }
}
