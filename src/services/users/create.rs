use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{UserService, profile_for_role};
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    users::{
        entities::UserRole,
        requests::{CreateUserRequest, NewUser},
        responses::UserResponse,
    },
};
use crate::services::common::{
    audit, bad_request, class_in_school, current_user, error_response, forbidden, not_found,
    resolve_school,
};
use crate::utils::password::hash_password_blocking;
use crate::utils::validate::{
    normalize_email, validate_email, validate_full_name, validate_password_simple,
};

pub async fn create_user(
    service: &UserService,
    request: &HttpRequest,
    req: CreateUserRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 1. 确定所属学校；总管理员账号不挂学校
    let school_id = if req.role == UserRole::HeadAdmin {
        if !current.is_head_admin() {
            return Ok(forbidden("Only a head admin can create head admins"));
        }
        None
    } else {
        let school_id = match resolve_school(&current, req.school_id) {
            Ok(id) => id,
            Err(resp) => return Ok(resp),
        };
        match storage.get_school_by_id(school_id).await {
            Ok(Some(_)) => Some(school_id),
            Ok(None) => return Ok(not_found(ErrorCode::SchoolNotFound, "School not found")),
            Err(e) => return Ok(error_response(&e)),
        }
    };

    // 2. 字段校验
    if let Err(msg) = validate_email(&req.email) {
        return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
    }
    if let Err(msg) = validate_full_name(&req.full_name) {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    if let Err(msg) = validate_password_simple(&req.password) {
        return Ok(bad_request(ErrorCode::PasswordPolicyFailed, msg));
    }

    let profile = profile_for_role(req.role, req.profile);
    if req.role == UserRole::Teacher && profile.subdivision.is_none() {
        return Ok(bad_request(
            ErrorCode::ValidationFailed,
            "Teachers require a subdivision",
        ));
    }
    if let (Some(class_id), Some(school_id)) = (profile.class_id, school_id)
        && let Err(resp) = class_in_school(&storage, class_id, school_id).await
    {
        return Ok(resp);
    }

    let password_hash = match hash_password_blocking(req.password).await {
        Ok(hash) => hash,
        Err(e) => return Ok(error_response(&e)),
    };

    let new_user = NewUser {
        school_id,
        email: normalize_email(&req.email),
        password_hash,
        full_name: req.full_name.trim().to_string(),
        role: req.role,
        profile,
    };

    match storage.create_user(new_user).await {
        Ok(user) => {
            info!("User {} ({}) created by {}", user.user.id, user.user.role, current.id);
            audit(
                &storage,
                request,
                NewAuditLog::new("user.create", "user")
                    .school(user.user.school_id)
                    .actor(current.id, current.school_id)
                    .target(user.user.id)
                    .details(serde_json::json!({ "role": user.user.role })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                UserResponse { user },
                "User created",
            )))
        }
        Err(SchoolHubError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "Email is already in use"),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}
