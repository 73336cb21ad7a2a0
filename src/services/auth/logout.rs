use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::warn;

use super::AuthService;
use crate::cache::session_key;
use crate::models::ApiResponse;
use crate::services::common::get_cache;
use crate::utils::jwt::JwtUtils;

/// 登出：删除会话并清空 cookie，令牌无效时同样返回成功
pub async fn handle_logout(service: &AuthService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let session = JwtUtils::extract_token(request)
        .and_then(|token| JwtUtils::verify_token(&token).ok())
        .map(|claims| claims.sid);

    if let Some(sid) = session {
        if let Err(e) = storage.delete_session(&sid).await {
            warn!("Failed to delete session on logout: {}", e);
        }
        if let Some(cache) = get_cache(request) {
            cache.remove(&session_key(&sid)).await;
        }
    }

    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_empty_auth_cookie())
        .json(ApiResponse::success_empty("Logged out")))
}
