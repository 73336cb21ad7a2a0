use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AuthService;
use crate::cache::session_key;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    auth::{ChangePasswordRequest, responses::MeResponse},
};
use crate::services::common::{audit, current_user, error_response, get_cache, not_found};
use crate::utils::password::{hash_password_blocking, verify_password};
use crate::utils::validate::validate_password_simple;

pub async fn handle_me(service: &AuthService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.get_user_detail(current.id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(MeResponse { user }, "OK"))),
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(error_response(&e)),
    }
}

/// 修改密码，成功后注销该用户的其他会话
pub async fn handle_change_password(
    service: &AuthService,
    change: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let user = match storage.get_user_by_id(current.id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    if !verify_password(&change.current_password, &user.password_hash) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            "Current password is incorrect",
        )));
    }

    if let Err(msg) = validate_password_simple(&change.new_password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::PasswordPolicyFailed, msg)));
    }

    let hash = match hash_password_blocking(change.new_password).await {
        Ok(hash) => hash,
        Err(e) => return Ok(error_response(&e)),
    };

    if let Err(e) = storage.update_user_password(user.id, &hash).await {
        return Ok(error_response(&e));
    }

    match storage
        .delete_user_sessions(user.id, Some(&current.session_token))
        .await
    {
        Ok(tokens) => {
            if let Some(cache) = get_cache(request) {
                for token in &tokens {
                    cache.remove(&session_key(token)).await;
                }
            }
            info!("User {} changed password, {} other sessions revoked", user.id, tokens.len());
        }
        Err(e) => return Ok(error_response(&e)),
    }

    audit(
        &storage,
        request,
        NewAuditLog::new("auth.password_change", "user")
            .actor(user.id, user.school_id)
            .target(user.id),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Password changed")))
}
