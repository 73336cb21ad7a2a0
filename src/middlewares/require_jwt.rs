/*!
 * 会话认证中间件
 *
 * 令牌优先从认证 Cookie 读取，其次是 `Authorization: Bearer <JWT>`。
 * 签名与过期时间校验通过后，按令牌中的 `sid` 查找会话记录，会话必须存在且未过期，
 * 对应用户必须处于启用状态。结果以 `session:{sid}` 为键缓存。
 *
 * 认证成功后 [`AuthUser`] 被放入请求扩展：
 *
 * ```rust,ignore
 * async fn handler(req: HttpRequest) -> ActixResult<HttpResponse> {
 *     let Some(user) = RequireJWT::extract_auth_user(&req) else { ... };
 *     ...
 * }
 * ```
 */

use crate::cache::{CacheResult, ObjectCache, get_json, insert_json, session_key};
use crate::config::AppConfig;
use crate::models::{ErrorCode, auth::entities::AuthUser, users::entities::UserRole};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败原因
enum AuthFailure {
    /// 返回 401
    Unauthorized(&'static str),
    /// 服务端异常，返回 500
    Internal(String),
}

// 辅助函数：提取令牌并还原会话对应的用户
async fn authenticate(req: &ServiceRequest) -> Result<AuthUser, AuthFailure> {
    let token = JwtUtils::extract_token(req.request())
        .ok_or(AuthFailure::Unauthorized("Authentication required"))?;

    let claims = JwtUtils::verify_token(&token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        AuthFailure::Unauthorized("Invalid or expired token")
    })?;
    let user_id = claims
        .user_id()
        .ok_or(AuthFailure::Unauthorized("Invalid token subject"))?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| AuthFailure::Internal("Cache not found in app data".to_string()))?;

    let cache_key = session_key(&claims.sid);
    if let CacheResult::Found(user) = get_json::<AuthUser>(cache.as_ref(), &cache_key).await {
        if user.id == user_id {
            return Ok(user);
        }
        cache.remove(&cache_key).await;
    }

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| AuthFailure::Internal("Storage not found in app data".to_string()))?;

    let session = storage
        .get_session_by_token(&claims.sid)
        .await
        .map_err(|e| AuthFailure::Internal(format!("Failed to load session: {e}")))?
        .ok_or(AuthFailure::Unauthorized("Session not found"))?;

    let now = chrono::Utc::now();
    if session.is_expired(now) {
        return Err(AuthFailure::Unauthorized("Session expired"));
    }
    if session.user_id != user_id {
        return Err(AuthFailure::Unauthorized("Session does not belong to token subject"));
    }

    let detail = storage
        .get_user_detail(user_id)
        .await
        .map_err(|e| AuthFailure::Internal(format!("Failed to load user: {e}")))?
        .ok_or(AuthFailure::Unauthorized("User not found"))?;

    if !detail.user.is_active {
        return Err(AuthFailure::Unauthorized("User is not active"));
    }

    let subdivision = match detail.user.role {
        UserRole::Teacher => detail.profile.subdivision,
        _ => None,
    };
    let class_id = match detail.user.role {
        UserRole::Student => detail.profile.class_id,
        _ => None,
    };
    let user = AuthUser::from_user(&detail.user, subdivision, class_id, &claims.sid);

    // 缓存时间不超过会话剩余时间
    let remaining = (session.expires_at - now).num_seconds().max(1) as u64;
    let ttl = AppConfig::get().cache.default_ttl.min(remaining);
    insert_json(cache.as_ref(), &cache_key, &user, ttl).await;

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行给 CORS 处理
            if req.method() == actix_web::http::Method::OPTIONS {
                let res = srv.call(req).await?.map_into_left_body();
                return Ok(res);
            }

            match authenticate(&req).await {
                Ok(user) => {
                    debug!("Session authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(AuthFailure::Unauthorized(reason)) => {
                    info!(
                        "Authentication failed for request to {}: {}",
                        req.path(),
                        reason
                    );
                    Ok(req.into_response(
                        create_error_response(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, reason)
                            .map_into_right_body(),
                    ))
                }
                Err(AuthFailure::Internal(message)) => {
                    error!("Authentication error for request to {}: {}", req.path(), message);
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            ErrorCode::InternalServerError,
                            "Internal server error",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取认证信息
impl RequireJWT {
    /// 从请求扩展中提取当前用户
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_auth_user(req: &actix_web::HttpRequest) -> Option<AuthUser> {
        req.extensions().get::<AuthUser>().cloned()
    }

    /// 从请求扩展中提取用户ID
    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<AuthUser>().map(|user| user.id)
    }

    /// 从请求扩展中提取用户角色
    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions().get::<AuthUser>().map(|user| user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{entities::UserProfile, requests::UpdateUserRequest};
    use crate::services::testing::TestState;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, HttpRequest, HttpResponse, test};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match RequireJWT::extract_user_id(&req) {
            Some(id) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    macro_rules! guarded_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.storage_data())
                    .app_data($state.cache_data())
                    .service(
                        web::scope("/guarded")
                            .wrap(RequireJWT)
                            .route("/whoami", web::get().to(whoami)),
                    ),
            )
            .await
        };
    }

    fn get(bearer: Option<&str>) -> actix_web::test::TestRequest {
        let req = test::TestRequest::get().uri("/guarded/whoami");
        match bearer {
            Some(value) => req.insert_header((AUTHORIZATION, value.to_string())),
            None => req,
        }
    }

    #[actix_web::test]
    async fn test_valid_session_is_cached() {
        let state = TestState::new().await;
        let (_, admin) = state.school("JWT1").await;
        let session = state.session(&admin).await;
        let app = guarded_app!(state);

        let resp = test::call_service(&app, get(Some(&session.bearer)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, admin.id.to_string());

        let cached = get_json::<AuthUser>(state.cache.as_ref(), &session_key(&session.sid)).await;
        assert!(matches!(cached, CacheResult::Found(user) if user.id == admin.id));
    }

    #[actix_web::test]
    async fn test_missing_or_garbage_token() {
        let state = TestState::new().await;
        let app = guarded_app!(state);

        let resp = test::call_service(&app, get(None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(&app, get(Some("Bearer not-a-jwt")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_deleted_session_is_rejected() {
        let state = TestState::new().await;
        let (_, admin) = state.school("JWT2").await;
        let session = state.session(&admin).await;
        state.storage.delete_session(&session.sid).await.unwrap();
        let app = guarded_app!(state);

        let resp = test::call_service(&app, get(Some(&session.bearer)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_expired_session_is_rejected() {
        let state = TestState::new().await;
        let (_, admin) = state.school("JWT3").await;
        let sid = "expired-session";
        let past = chrono::Utc::now().timestamp() - 60;
        state
            .storage
            .create_session(admin.id, sid, None, None, past)
            .await
            .unwrap();
        // 令牌本身未过期，会话记录已过期
        let jwt = JwtUtils::generate_session_token(
            admin.id,
            admin.role,
            admin.school_id,
            None,
            sid,
            JwtUtils::session_expiry(),
        )
        .unwrap();
        let app = guarded_app!(state);

        let resp =
            test::call_service(&app, get(Some(&format!("Bearer {jwt}"))).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_inactive_user_is_rejected() {
        let state = TestState::new().await;
        let (school_id, _) = state.school("JWT4").await;
        let teacher = state
            .user(Some(school_id), "t@jwt4.edu", UserRole::Teacher, UserProfile::default())
            .await;
        let session = state.session(&teacher).await;
        state
            .storage
            .update_user(
                teacher.id,
                UpdateUserRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let app = guarded_app!(state);

        let resp = test::call_service(&app, get(Some(&session.bearer)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_cached_identity_skips_storage() {
        let state = TestState::new().await;
        let (_, admin) = state.school("JWT5").await;
        let session = state.session(&admin).await;
        let app = guarded_app!(state);

        let resp = test::call_service(&app, get(Some(&session.bearer)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // 会话行已删除，但缓存仍在有效期内
        state.storage.delete_session(&session.sid).await.unwrap();
        let resp = test::call_service(&app, get(Some(&session.bearer)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        state.cache.remove(&session_key(&session.sid)).await;
        let resp = test::call_service(&app, get(Some(&session.bearer)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
