use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    classes::{requests::CreateClassRequest, responses::ClassResponse},
};
use crate::services::common::{
    audit, bad_request, check_school_teacher, current_user, error_response, resolve_school,
};
use crate::utils::validate::validate_required_text;

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    mut class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let school_id = match resolve_school(&current, None) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    if let Err(msg) = validate_required_text(&class_data.name, 100) {
        return Ok(bad_request(ErrorCode::ValidationFailed, format!("name: {msg}")));
    }
    class_data.name = class_data.name.trim().to_string();

    if let Some(teacher_id) = class_data.class_teacher_id
        && let Err(resp) = check_school_teacher(&storage, school_id, teacher_id, "class_teacher_id").await
    {
        return Ok(resp);
    }

    match storage.create_class(school_id, class_data).await {
        Ok(class) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("class.create", "class")
                    .actor(current.id, current.school_id)
                    .target(class.id)
                    .details(serde_json::json!({ "name": class.name })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(ClassResponse { class }, "Class created")))
        }
        Err(SchoolHubError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::ClassAlreadyExists, "Class name already exists"),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}
