//! 服务层共用的请求辅助函数

use actix_web::{HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::{error, warn};

use crate::cache::{ObjectCache, session_key};
use crate::errors::SchoolHubError;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog, auth::entities::AuthUser,
    classes::entities::Class, notifications::entities::NewNotification,
    users::entities::UserRole,
};
use crate::storage::Storage;

/// 当前登录用户，缺失时返回 401 响应
pub(crate) fn current_user(request: &HttpRequest) -> Result<AuthUser, HttpResponse> {
    RequireJWT::extract_auth_user(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        ))
    })
}

pub(crate) fn get_cache(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

pub(crate) fn client_ip(request: &HttpRequest) -> Option<String> {
    request
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string())
}

pub(crate) fn user_agent(request: &HttpRequest) -> Option<String> {
    request
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.chars().take(255).collect())
}

/// 将存储层错误映射为 HTTP 响应，未归类的错误记录日志后返回 500
pub(crate) fn error_response(err: &SchoolHubError) -> HttpResponse {
    match err {
        SchoolHubError::NotFound(msg) => {
            HttpResponse::NotFound().json(ApiResponse::error_empty(ErrorCode::NotFound, msg.as_str()))
        }
        SchoolHubError::Validation(msg) => HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::ValidationFailed, msg.as_str()),
        ),
        SchoolHubError::Conflict(_) => HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::Conflict,
            "Resource already exists",
        )),
        SchoolHubError::Authentication(msg) => HttpResponse::Unauthorized().json(
            ApiResponse::error_empty(ErrorCode::Unauthorized, msg.as_str()),
        ),
        SchoolHubError::Authorization(msg) => {
            HttpResponse::Forbidden().json(ApiResponse::error_empty(ErrorCode::Forbidden, msg.as_str()))
        }
        SchoolHubError::InvalidTransition(msg) => HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::InvalidStatusTransition, msg.as_str()),
        ),
        SchoolHubError::Csv(msg) => HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ImportFailed,
            msg.as_str(),
        )),
        other => {
            error!("{}", other);
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Internal server error",
            ))
        }
    }
}

pub(crate) fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(ErrorCode::Forbidden, message))
}

pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn not_found(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

/// 解析实际操作的学校：总管理员须显式指定，其余角色固定为所属学校
pub(crate) fn resolve_school(user: &AuthUser, requested: Option<i64>) -> Result<i64, HttpResponse> {
    if user.is_head_admin() {
        return requested.ok_or_else(|| {
            bad_request(ErrorCode::ValidationFailed, "school_id is required")
        });
    }
    match user.school_id {
        Some(id) if requested.is_none_or(|r| r == id) => Ok(id),
        Some(_) => Err(forbidden("Cannot act on another school")),
        None => Err(forbidden("User is not attached to a school")),
    }
}

/// 列表查询的学校范围：总管理员可不限学校
pub(crate) fn list_scope(user: &AuthUser, requested: Option<i64>) -> Result<Option<i64>, HttpResponse> {
    if user.is_head_admin() {
        return Ok(requested);
    }
    resolve_school(user, requested).map(Some)
}

/// 班级须属于给定学校
pub(crate) async fn class_in_school(
    storage: &Arc<dyn Storage>,
    class_id: i64,
    school_id: i64,
) -> Result<Class, HttpResponse> {
    match storage.get_class_by_id(class_id).await {
        Ok(Some(class)) if class.school_id == school_id => Ok(class),
        Ok(_) => Err(bad_request(
            ErrorCode::ClassNotFound,
            format!("Class {class_id} does not belong to this school"),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// 教师须是本校有效教师
pub(crate) async fn check_school_teacher(
    storage: &Arc<dyn Storage>,
    school_id: i64,
    teacher_id: i64,
    field: &str,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_id(teacher_id).await {
        Ok(Some(user))
            if user.role == UserRole::Teacher
                && user.is_active
                && user.school_id == Some(school_id) =>
        {
            Ok(())
        }
        Ok(_) => Err(bad_request(
            ErrorCode::ValidationFailed,
            format!("{field} must be an active teacher of this school"),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// 注销用户的全部会话并清除对应缓存
pub(crate) async fn revoke_sessions(storage: &Arc<dyn Storage>, request: &HttpRequest, user_id: i64) {
    match storage.delete_user_sessions(user_id, None).await {
        Ok(tokens) => {
            if let Some(cache) = get_cache(request) {
                for token in &tokens {
                    cache.remove(&session_key(token)).await;
                }
            }
        }
        Err(e) => warn!("Failed to revoke sessions of user {}: {}", user_id, e),
    }
}

/// 清理用户会话对应的缓存身份，会话保留，下次请求重新从库中加载
pub(crate) async fn refresh_sessions(storage: &Arc<dyn Storage>, request: &HttpRequest, user_id: i64) {
    let Some(cache) = get_cache(request) else {
        return;
    };
    match storage.list_user_session_tokens(user_id).await {
        Ok(tokens) => {
            for token in &tokens {
                cache.remove(&session_key(token)).await;
            }
        }
        Err(e) => warn!("Failed to list sessions of user {}: {}", user_id, e),
    }
}

/// 注销学校下所有用户的会话
pub(crate) async fn revoke_school_sessions(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    school_id: i64,
) {
    match storage.delete_school_sessions(school_id).await {
        Ok(tokens) => {
            if let Some(cache) = get_cache(request) {
                for token in &tokens {
                    cache.remove(&session_key(token)).await;
                }
            }
        }
        Err(e) => warn!("Failed to revoke sessions of school {}: {}", school_id, e),
    }
}

/// 写入审计日志，失败只记录不影响请求
pub(crate) async fn audit(storage: &Arc<dyn Storage>, request: &HttpRequest, entry: NewAuditLog) {
    let entry = entry.ip(client_ip(request));
    let action = entry.action.clone();
    if let Err(e) = storage.create_audit_log(entry).await {
        warn!("Failed to record audit log '{}': {}", action, e);
    }
}

/// 批量发送通知，失败只记录
pub(crate) async fn notify(storage: &Arc<dyn Storage>, notifications: Vec<NewNotification>) {
    if notifications.is_empty() {
        return;
    }
    let count = notifications.len();
    if let Err(e) = storage.create_notifications(notifications).await {
        warn!("Failed to create {} notifications: {}", count, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, school_id: Option<i64>) -> AuthUser {
        AuthUser {
            id: 1,
            school_id,
            email: "a@b.edu".to_string(),
            full_name: "A".to_string(),
            role,
            subdivision: None,
            class_id: None,
            session_token: "s".to_string(),
        }
    }

    #[test]
    fn test_resolve_school() {
        let admin = user(UserRole::Admin, Some(4));
        assert_eq!(resolve_school(&admin, None).ok(), Some(4));
        assert_eq!(resolve_school(&admin, Some(4)).ok(), Some(4));
        assert!(resolve_school(&admin, Some(5)).is_err());

        let head = user(UserRole::HeadAdmin, None);
        assert!(resolve_school(&head, None).is_err());
        assert_eq!(resolve_school(&head, Some(9)).ok(), Some(9));
        assert_eq!(list_scope(&head, None).ok(), Some(None));
        assert_eq!(list_scope(&admin, None).ok(), Some(Some(4)));
    }

    #[test]
    fn test_error_status_mapping() {
        use actix_web::http::StatusCode;
        assert_eq!(
            error_response(&SchoolHubError::not_found("x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(&SchoolHubError::validation("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&SchoolHubError::conflict("x")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(&SchoolHubError::database_operation("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
