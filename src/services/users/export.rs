//! 用户导出（CSV），列与导入格式兼容

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;
use tracing::error;

use super::UserService;
use crate::models::users::{entities::UserDetail, requests::UserSchoolParams};
use crate::services::common::{current_user, error_response, resolve_school};

const EXPORT_HEADER: [&str; 10] = [
    "id",
    "full_name",
    "email",
    "role",
    "subdivision",
    "class_name",
    "admission_number",
    "is_active",
    "last_login",
    "created_at",
];

fn write_csv(users: &[UserDetail], class_names: &HashMap<i64, String>) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(EXPORT_HEADER)?;

    for detail in users {
        let user = &detail.user;
        let profile = &detail.profile;
        wtr.write_record([
            user.id.to_string(),
            user.full_name.clone(),
            user.email.clone(),
            user.role.to_string(),
            profile
                .subdivision
                .map(|s| s.to_string())
                .unwrap_or_default(),
            profile
                .class_id
                .and_then(|id| class_names.get(&id).cloned())
                .unwrap_or_default(),
            profile.admission_number.clone().unwrap_or_default(),
            user.is_active.to_string(),
            user.last_login.map(|t| t.to_rfc3339()).unwrap_or_default(),
            user.created_at.to_rfc3339(),
        ])?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

pub async fn export_users(
    service: &UserService,
    request: &HttpRequest,
    params: UserSchoolParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, params.school_id) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let users = match storage.list_school_user_details(school_id).await {
        Ok(users) => users,
        Err(e) => return Ok(error_response(&e)),
    };
    let class_names = match storage.list_school_classes(school_id).await {
        Ok(classes) => classes.into_iter().map(|c| (c.id, c.name)).collect(),
        Err(e) => return Ok(error_response(&e)),
    };

    let data = write_csv(&users, &class_names).map_err(|e| {
        error!("CSV export failed: {}", e);
        actix_web::error::ErrorInternalServerError(format!("CSV export failed: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"users-school-{school_id}.csv\""),
        ))
        .body(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{User, UserProfile, UserRole};

    #[test]
    fn test_write_csv_uses_class_names() {
        let now = chrono::Utc::now();
        let detail = UserDetail {
            user: User {
                id: 7,
                school_id: Some(1),
                email: "s@gvhs.edu".to_string(),
                password_hash: "secret-hash".to_string(),
                full_name: "Sam, Jr.".to_string(),
                role: UserRole::Student,
                is_active: true,
                login_attempts: 0,
                locked_until: None,
                last_login: None,
                avatar_url: None,
                created_at: now,
                updated_at: now,
            },
            profile: UserProfile {
                class_id: Some(3),
                ..Default::default()
            },
        };
        let names = HashMap::from([(3, "7A".to_string())]);
        let out = String::from_utf8(write_csv(&[detail], &names).unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some(EXPORT_HEADER.join(",").as_str()));
        let row = lines.next().unwrap();
        assert!(row.starts_with("7,\"Sam, Jr.\",s@gvhs.edu,student,,7A,"));
        assert!(!out.contains("secret-hash"));
    }
}
