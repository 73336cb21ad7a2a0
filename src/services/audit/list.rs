use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AuditService;
use crate::models::{ApiResponse, audit::requests::AuditLogListParams};
use crate::services::common::{current_user, error_response, list_scope};

pub async fn list_audit_logs(
    service: &AuditService,
    request: &HttpRequest,
    query: AuditLogListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let scope = match list_scope(&current, query.school_id) {
        Ok(scope) => scope,
        Err(resp) => return Ok(resp),
    };

    match storage.list_audit_logs_with_pagination(scope, query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "OK"))),
        Err(e) => Ok(error_response(&e)),
    }
}
