use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::{error, info, warn};

use super::AuthService;
use super::lockout::{lock_deadline, remaining_lock_minutes};
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    auth::{LoginRequest, LoginResponse},
    schools::entities::SchoolStatus,
};
use crate::services::common::{audit, client_ip, user_agent};
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;
use crate::utils::random_code::generate_session_token;
use crate::utils::validate::normalize_email;

fn auth_failed() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::AuthFailed,
        "Email or password is incorrect",
    ))
}

fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError()
        .json(ApiResponse::error_empty(ErrorCode::InternalServerError, message))
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = service.get_config();
    let email = normalize_email(&login_request.email);

    // 1. 查找用户
    let user = match storage.get_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(auth_failed()),
        Err(e) => {
            error!("Login lookup failed: {}", e);
            return Ok(internal_error("Login failed"));
        }
    };

    // 2. 账号与学校状态
    if !user.is_active {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AccountInactive,
            "Account is deactivated",
        )));
    }

    if let Some(school_id) = user.school_id {
        match storage.get_school_by_id(school_id).await {
            Ok(Some(school)) if school.status == SchoolStatus::Suspended => {
                return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::SchoolSuspended,
                    "School is suspended",
                )));
            }
            Ok(_) => {}
            Err(e) => {
                error!("Login school lookup failed: {}", e);
                return Ok(internal_error("Login failed"));
            }
        }
    }

    // 3. 锁定检查：锁定期间即使密码正确也拒绝
    let now = Utc::now();
    if let Some(minutes) = remaining_lock_minutes(user.locked_until, now) {
        return Ok(HttpResponse::build(actix_web::http::StatusCode::LOCKED).json(
            ApiResponse::error_empty(
                ErrorCode::AccountLocked,
                format!("Account is locked, try again in {minutes} minutes"),
            ),
        ));
    }

    // 4. 校验密码
    if !verify_password(&login_request.password, &user.password_hash) {
        match storage
            .record_login_failure(
                user.id,
                config.auth.max_login_attempts,
                lock_deadline(now, config.auth.lockout_minutes),
                now.timestamp(),
            )
            .await
        {
            Ok((attempts, Some(_))) => {
                warn!("User {} locked after {} failed logins", user.id, attempts);
            }
            Ok(_) => {}
            Err(e) => error!("Failed to record login failure for user {}: {}", user.id, e),
        }
        return Ok(auth_failed());
    }

    if let Err(e) = storage.record_login_success(user.id).await {
        error!("Failed to reset login counters for user {}: {}", user.id, e);
    }

    // 5. 创建会话并签发令牌
    let detail = match storage.get_user_detail(user.id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return Ok(auth_failed()),
        Err(e) => {
            error!("Failed to load user detail: {}", e);
            return Ok(internal_error("Login failed"));
        }
    };

    let session_token = generate_session_token();
    let expires_at = JwtUtils::session_expiry();
    if let Err(e) = storage
        .create_session(
            user.id,
            &session_token,
            user_agent(request),
            client_ip(request),
            expires_at.timestamp(),
        )
        .await
    {
        error!("Failed to create session: {}", e);
        return Ok(internal_error("Login failed, unable to create session"));
    }

    let jwt = match JwtUtils::generate_session_token(
        user.id,
        user.role,
        user.school_id,
        detail.profile.subdivision,
        &session_token,
        expires_at,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to generate JWT token: {}", e);
            return Ok(internal_error("Login failed, unable to generate token"));
        }
    };

    info!("User {} logged in", user.id);
    audit(
        &storage,
        request,
        NewAuditLog::new("auth.login", "user")
            .actor(user.id, user.school_id)
            .target(user.id),
    )
    .await;

    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_auth_cookie(&jwt))
        .json(ApiResponse::success(
            LoginResponse {
                user: detail,
                expires_at,
            },
            "Login successful",
        )))
}

#[cfg(test)]
mod tests {
    use crate::routes::configure_auth_routes;
    use crate::services::testing::{PASSWORD, TestState};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    fn login_request(email: &str, password: &str, peer: &str) -> actix_web::test::TestRequest {
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .peer_addr(peer.parse().unwrap())
            .set_json(serde_json::json!({ "email": email, "password": password }))
    }

    #[actix_web::test]
    async fn test_login_sets_cookie_and_session() {
        let state = TestState::new().await;
        let (_, admin) = state.school("LGN1").await;
        let app = test::init_service(
            App::new()
                .app_data(state.storage_data())
                .app_data(state.cache_data())
                .configure(configure_auth_routes),
        )
        .await;

        let resp = test::call_service(
            &app,
            login_request(" Admin@LGN1.edu ", PASSWORD, "10.1.0.1:4000").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.response().cookies().next().is_some());

        let user = state.storage.get_user_by_id(admin.id).await.unwrap().unwrap();
        assert!(user.last_login.is_some());
        assert_eq!(user.login_attempts, 0);
    }

    #[actix_web::test]
    async fn test_locked_account_rejects_correct_password() {
        let state = TestState::new().await;
        let (_, admin) = state.school("LGN2").await;
        let app = test::init_service(
            App::new()
                .app_data(state.storage_data())
                .app_data(state.cache_data())
                .configure(configure_auth_routes),
        )
        .await;

        for _ in 0..4 {
            let resp = test::call_service(
                &app,
                login_request("admin@lgn2.edu", "wrong-password", "10.1.0.2:4000").to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
        let resp = test::call_service(
            &app,
            login_request("admin@lgn2.edu", "wrong-password", "10.1.0.2:4000").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let user = state.storage.get_user_by_id(admin.id).await.unwrap().unwrap();
        assert_eq!(user.login_attempts, 5);
        assert!(user.locked_until.is_some());

        // 锁定期间即使密码正确也返回 423，且不创建会话
        let resp = test::call_service(
            &app,
            login_request("admin@lgn2.edu", PASSWORD, "10.1.0.2:4000").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::LOCKED);
        assert!(resp.response().cookies().next().is_none());
    }

    #[actix_web::test]
    async fn test_unknown_email_is_unauthorized() {
        let state = TestState::new().await;
        let app = test::init_service(
            App::new()
                .app_data(state.storage_data())
                .app_data(state.cache_data())
                .configure(configure_auth_routes),
        )
        .await;

        let resp = test::call_service(
            &app,
            login_request("nobody@nowhere.edu", PASSWORD, "10.1.0.3:4000").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
