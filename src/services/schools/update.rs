use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SchoolService;
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    schools::{requests::UpdateSchoolRequest, responses::SchoolResponse},
};
use crate::models::schools::entities::SchoolStatus;
use crate::services::common::{
    audit, bad_request, current_user, error_response, not_found, revoke_school_sessions,
};
use crate::utils::validate::{normalize_email, validate_email, validate_required_text};

fn validate_update(update: &UpdateSchoolRequest) -> Result<(), String> {
    if let Some(name) = &update.name {
        validate_required_text(name, 200).map_err(|e| format!("name: {e}"))?;
    }
    if let Some(email) = &update.email {
        validate_email(email).map_err(|e| format!("email: {e}"))?;
    }
    let negative = |rate: Option<f64>| rate.is_some_and(|r| r < 0.0 || !r.is_finite());
    if negative(update.student_rate) || negative(update.teacher_rate) {
        return Err("Rates must not be negative".to_string());
    }
    Ok(())
}

pub async fn update_school(
    service: &SchoolService,
    request: &HttpRequest,
    school_id: i64,
    mut update: UpdateSchoolRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = validate_update(&update) {
        return Ok(bad_request(ErrorCode::ValidationFailed, msg));
    }
    update.email = update.email.as_deref().map(normalize_email);
    update.name = update.name.map(|n| n.trim().to_string());
    let status = update.status;

    match storage.update_school(school_id, update).await {
        Ok(Some(school)) => {
            // 停用学校后其用户的已登录会话立即失效
            if status == Some(SchoolStatus::Suspended) {
                revoke_school_sessions(&storage, request, school.id).await;
            }
            audit(
                &storage,
                request,
                NewAuditLog::new("school.update", "school")
                    .school(Some(school.id))
                    .actor(current.id, current.school_id)
                    .target(school.id)
                    .details(serde_json::json!({ "status": status })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(SchoolResponse { school }, "School updated")))
        }
        Ok(None) => Ok(not_found(ErrorCode::SchoolNotFound, "School not found")),
        Err(SchoolHubError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::SchoolAlreadyExists, "Email is already in use"),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserProfile, UserRole};
    use crate::routes::{configure_auth_routes, configure_school_routes};
    use crate::services::testing::TestState;
    use actix_web::http::{StatusCode, header::AUTHORIZATION};
    use actix_web::{App, test};

    #[::core::prelude::v1::test]
    fn test_validate_update() {
        let bad_rate = UpdateSchoolRequest {
            student_rate: Some(-1.0),
            ..Default::default()
        };
        assert!(validate_update(&bad_rate).is_err());
        assert!(validate_update(&UpdateSchoolRequest::default()).is_ok());
    }

    #[actix_web::test]
    async fn test_suspension_revokes_school_sessions() {
        let state = TestState::new().await;
        let (school_id, admin) = state.school("SUS").await;
        let (_, other_admin) = state.school("OTH").await;
        let teacher = state
            .user(Some(school_id), "t@sus.edu", UserRole::Teacher, UserProfile::default())
            .await;
        let head = state
            .user(None, "root@hub.edu", UserRole::HeadAdmin, UserProfile::default())
            .await;
        let head_session = state.session(&head).await;
        let teacher_session = state.session(&teacher).await;
        let admin_session = state.session(&admin).await;
        let other_session = state.session(&other_admin).await;

        let app = test::init_service(
            App::new()
                .app_data(state.storage_data())
                .app_data(state.cache_data())
                .configure(configure_auth_routes)
                .configure(configure_school_routes),
        )
        .await;
        let me = |bearer: &str| {
            test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .insert_header((AUTHORIZATION, bearer.to_string()))
                .to_request()
        };

        // 先缓存教师身份
        let resp = test::call_service(&app, me(&teacher_session.bearer)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/schools/{school_id}"))
                .insert_header((AUTHORIZATION, head_session.bearer.clone()))
                .set_json(serde_json::json!({ "status": "suspended" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        for bearer in [&teacher_session.bearer, &admin_session.bearer] {
            let resp = test::call_service(&app, me(bearer)).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
        let resp = test::call_service(&app, me(&other_session.bearer)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = test::call_service(&app, me(&head_session.bearer)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
