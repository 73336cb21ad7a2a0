use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{UserService, can_manage, profile_for_role};
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    users::{requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::common::{
    audit, bad_request, class_in_school, current_user, error_response, not_found,
    refresh_sessions, revoke_sessions,
};
use crate::utils::password::hash_password_blocking;
use crate::utils::validate::{
    normalize_email, validate_email, validate_full_name, validate_password_simple,
};

/// 本次更新涉及的字段名，写入审计详情
fn changed_fields(update: &UpdateUserRequest) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if update.full_name.is_some() {
        fields.push("full_name");
    }
    if update.email.is_some() {
        fields.push("email");
    }
    if update.password.is_some() {
        fields.push("password");
    }
    if update.is_active.is_some() {
        fields.push("is_active");
    }
    if update.avatar_url.is_some() {
        fields.push("avatar_url");
    }
    if update.profile.is_some() {
        fields.push("profile");
    }
    fields
}

/// 更新后对已登录会话的处理
#[derive(Debug, PartialEq, Eq)]
enum SessionEffect {
    /// 停用或重置密码：删除全部会话
    Revoke,
    /// 资料变化：清理缓存身份，下次请求重新加载角色、细分与班级
    Refresh,
    Keep,
}

fn session_effect(update: &UpdateUserRequest) -> SessionEffect {
    if update.is_active == Some(false) || update.password.is_some() {
        SessionEffect::Revoke
    } else if update.profile.is_some()
        || update.email.is_some()
        || update.full_name.is_some()
        || update.is_active.is_some()
    {
        SessionEffect::Refresh
    } else {
        SessionEffect::Keep
    }
}

pub async fn update_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
    mut update: UpdateUserRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let target = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if can_manage(&current, &user) => user,
        Ok(_) => return Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => return Ok(error_response(&e)),
    };

    if update.is_active == Some(false) && target.id == current.id {
        return Ok(bad_request(
            ErrorCode::CannotDeleteSelf,
            "You cannot deactivate your own account",
        ));
    }

    // 字段校验
    if let Some(name) = &update.full_name {
        if let Err(msg) = validate_full_name(name) {
            return Ok(bad_request(ErrorCode::ValidationFailed, msg));
        }
        update.full_name = Some(name.trim().to_string());
    }
    if let Some(email) = &update.email {
        if let Err(msg) = validate_email(email) {
            return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
        }
        update.email = Some(normalize_email(email));
    }
    if let Some(profile) = update.profile.take() {
        let profile = profile_for_role(target.role, profile);
        if let (Some(class_id), Some(school_id)) = (profile.class_id, target.school_id)
            && let Err(resp) = class_in_school(&storage, class_id, school_id).await
        {
            return Ok(resp);
        }
        update.profile = Some(profile);
    }

    let fields = changed_fields(&update);
    let effect = session_effect(&update);

    // 管理员重置密码，存储层只接收哈希
    if let Some(password) = update.password.take() {
        if let Err(msg) = validate_password_simple(&password) {
            return Ok(bad_request(ErrorCode::PasswordPolicyFailed, msg));
        }
        match hash_password_blocking(password).await {
            Ok(hash) => update.password = Some(hash),
            Err(e) => return Ok(error_response(&e)),
        }
    }

    match storage.update_user(user_id, update).await {
        Ok(Some(user)) => {
            match effect {
                SessionEffect::Revoke => revoke_sessions(&storage, request, user_id).await,
                SessionEffect::Refresh => refresh_sessions(&storage, request, user_id).await,
                SessionEffect::Keep => {}
            }
            info!("User {} updated by {}: {:?}", user_id, current.id, fields);
            audit(
                &storage,
                request,
                NewAuditLog::new("user.update", "user")
                    .school(user.user.school_id)
                    .actor(current.id, current.school_id)
                    .target(user_id)
                    .details(serde_json::json!({ "fields": fields })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse { user }, "User updated")))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(SchoolHubError::Validation(msg)) => Ok(bad_request(ErrorCode::LastAdmin, msg)),
        Err(SchoolHubError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "Email is already in use"),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_fields() {
        let update = UpdateUserRequest {
            email: Some("x@y.edu".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(changed_fields(&update), vec!["email", "is_active"]);
        assert!(changed_fields(&UpdateUserRequest::default()).is_empty());
    }

    #[test]
    fn test_session_effect() {
        let deactivate = UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(session_effect(&deactivate), SessionEffect::Revoke);

        let reset = UpdateUserRequest {
            password: Some("hash".to_string()),
            profile: Some(Default::default()),
            ..Default::default()
        };
        assert_eq!(session_effect(&reset), SessionEffect::Revoke);

        // 细分或班级变化后缓存中的身份必须失效
        let moved = UpdateUserRequest {
            profile: Some(Default::default()),
            ..Default::default()
        };
        assert_eq!(session_effect(&moved), SessionEffect::Refresh);

        let avatar = UpdateUserRequest {
            avatar_url: Some("/a.png".to_string()),
            ..Default::default()
        };
        assert_eq!(session_effect(&avatar), SessionEffect::Keep);
    }

    #[actix_web::test]
    async fn test_demoted_director_loses_report_access() {
        use crate::models::users::entities::{TeacherSubdivision, UserProfile, UserRole};
        use crate::routes::{configure_report_routes, configure_user_routes};
        use crate::services::testing::TestState;
        use actix_web::http::{StatusCode, header::AUTHORIZATION};
        use actix_web::{App, test};

        let state = TestState::new().await;
        let (school_id, admin) = state.school("DMT").await;
        let director = state
            .user(
                Some(school_id),
                "director@dmt.edu",
                UserRole::Teacher,
                UserProfile {
                    subdivision: Some(TeacherSubdivision::Director),
                    ..Default::default()
                },
            )
            .await;
        let admin_session = state.session(&admin).await;
        let director_session = state.session(&director).await;

        let app = test::init_service(
            App::new()
                .app_data(state.storage_data())
                .app_data(state.cache_data())
                .configure(configure_user_routes)
                .configure(configure_report_routes),
        )
        .await;
        let overview = || {
            test::TestRequest::get()
                .uri("/api/v1/reports/overview")
                .insert_header((AUTHORIZATION, director_session.bearer.clone()))
                .to_request()
        };

        let resp = test::call_service(&app, overview()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/users/{}", director.id))
                .insert_header((AUTHORIZATION, admin_session.bearer.clone()))
                .set_json(serde_json::json!({ "profile": { "subdivision": "subject_teacher" } }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        // 会话仍然有效，但身份按新的细分角色重新加载
        let resp = test::call_service(&app, overview()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(
            state
                .storage
                .get_session_by_token(&director_session.sid)
                .await
                .unwrap()
                .is_some()
        );
    }
}
