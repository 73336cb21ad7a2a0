use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ClassService, visible_class};
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode,
    audit::entities::NewAuditLog,
    classes::{requests::UpdateClassRequest, responses::ClassResponse},
};
use crate::services::common::{
    audit, bad_request, check_school_teacher, current_user, error_response, not_found,
};
use crate::utils::validate::validate_required_text;

pub async fn update_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    mut update: UpdateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let class = match visible_class(&storage, &current, class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => return Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(resp) => return Ok(resp),
    };

    if let Some(name) = &update.name {
        if let Err(msg) = validate_required_text(name, 100) {
            return Ok(bad_request(ErrorCode::ValidationFailed, format!("name: {msg}")));
        }
        update.name = Some(name.trim().to_string());
    }
    if let Some(teacher_id) = update.class_teacher_id
        && let Err(resp) = check_school_teacher(&storage, class.school_id, teacher_id, "class_teacher_id").await
    {
        return Ok(resp);
    }

    match storage.update_class(class_id, update).await {
        Ok(Some(class)) => {
            audit(
                &storage,
                request,
                NewAuditLog::new("class.update", "class")
                    .school(Some(class.school_id))
                    .actor(current.id, current.school_id)
                    .target(class.id),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(ClassResponse { class }, "Class updated")))
        }
        Ok(None) => Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(SchoolHubError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::ClassAlreadyExists, "Class name already exists"),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}
