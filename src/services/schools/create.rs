use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::SchoolService;
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    schools::{
        requests::{CreateSchoolRequest, NewSchool},
        responses::CreateSchoolResponse,
    },
    users::{
        entities::{UserProfile, UserRole},
        requests::NewUser,
    },
};
use crate::services::common::{audit, bad_request, current_user, error_response};
use crate::storage::Storage;
use crate::utils::password::hash_password_blocking;
use crate::utils::random_code::generate_code;
use crate::utils::validate::{
    normalize_email, validate_email, validate_full_name, validate_password_simple,
    validate_required_text, validate_school_code,
};

const GENERATED_CODE_LEN: usize = 6;
const GENERATED_CODE_ATTEMPTS: usize = 5;

/// 生成一个尚未被占用的学校代码
async fn unique_school_code(storage: &dyn Storage) -> Result<String, SchoolHubError> {
    for _ in 0..GENERATED_CODE_ATTEMPTS {
        let code = generate_code(GENERATED_CODE_LEN);
        if storage.get_school_by_code(&code).await?.is_none() {
            return Ok(code);
        }
    }
    Err(SchoolHubError::conflict("Unable to generate a unique school code"))
}

fn validate_request(req: &CreateSchoolRequest) -> Result<(), String> {
    validate_required_text(&req.name, 200).map_err(|e| format!("name: {e}"))?;
    validate_email(&req.email).map_err(|e| format!("email: {e}"))?;
    validate_full_name(&req.admin_full_name).map_err(|e| format!("admin_full_name: {e}"))?;
    validate_email(&req.admin_email).map_err(|e| format!("admin_email: {e}"))?;
    if let Some(code) = &req.code {
        validate_school_code(code).map_err(|e| format!("code: {e}"))?;
    }
    if req.student_rate < 0.0 || req.teacher_rate < 0.0 {
        return Err("Rates must not be negative".to_string());
    }
    Ok(())
}

pub async fn create_school(
    service: &SchoolService,
    request: &HttpRequest,
    req: CreateSchoolRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = validate_request(&req) {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    if let Err(msg) = validate_password_simple(&req.admin_password) {
        return Ok(bad_request(ErrorCode::PasswordPolicyFailed, msg));
    }

    let code = match req.code.as_deref() {
        Some(code) => code.trim().to_uppercase(),
        None => match unique_school_code(storage.as_ref()).await {
            Ok(code) => code,
            Err(e) => return Ok(error_response(&e)),
        },
    };

    let password_hash = match hash_password_blocking(req.admin_password).await {
        Ok(hash) => hash,
        Err(e) => return Ok(error_response(&e)),
    };

    let school = NewSchool {
        name: req.name.trim().to_string(),
        code,
        email: normalize_email(&req.email),
        phone: req.phone,
        address: req.address,
        student_rate: req.student_rate,
        teacher_rate: req.teacher_rate,
    };
    let admin = NewUser {
        school_id: None,
        email: normalize_email(&req.admin_email),
        password_hash,
        full_name: req.admin_full_name.trim().to_string(),
        role: UserRole::Admin,
        profile: UserProfile::default(),
    };

    match storage.create_school_with_admin(school, admin).await {
        Ok((school, admin)) => {
            info!("School {} ({}) created with admin {}", school.id, school.code, admin.id);
            audit(
                &storage,
                request,
                NewAuditLog::new("school.create", "school")
                    .school(Some(school.id))
                    .actor(current.id, current.school_id)
                    .target(school.id)
                    .details(serde_json::json!({ "code": school.code, "admin_id": admin.id })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                CreateSchoolResponse { school, admin },
                "School created",
            )))
        }
        Err(SchoolHubError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::SchoolAlreadyExists,
                "School code or an email address is already in use",
            ),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateSchoolRequest {
        CreateSchoolRequest {
            name: "Green Valley High".to_string(),
            code: Some("GVHS".to_string()),
            email: "office@gvhs.edu".to_string(),
            phone: None,
            address: None,
            student_rate: 2.0,
            teacher_rate: 4.0,
            admin_full_name: "Ada Admin".to_string(),
            admin_email: "ada@gvhs.edu".to_string(),
            admin_password: "Classroom42".to_string(),
        }
    }

    #[test]
    fn test_validate_request() {
        assert!(validate_request(&request()).is_ok());

        let mut bad = request();
        bad.code = Some("G V".to_string());
        assert!(validate_request(&bad).unwrap_err().starts_with("code"));

        let mut bad = request();
        bad.teacher_rate = -1.0;
        assert!(validate_request(&bad).is_err());

        let mut bad = request();
        bad.admin_email = "nope".to_string();
        assert!(validate_request(&bad).unwrap_err().starts_with("admin_email"));
    }
}
