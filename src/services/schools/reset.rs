use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::path::Path;
use tracing::info;

use super::SchoolService;
use crate::config::AppConfig;
use crate::errors::SchoolHubError;
use crate::models::{
    ApiResponse, ErrorCode, audit::entities::NewAuditLog,
    schools::responses::SchoolResetResponse,
};
use crate::services::common::{audit, current_user, error_response, get_cache, not_found};
use crate::services::files::remove_stored_files;

/// 清空学校的教学数据与非管理员用户
pub async fn reset_school(
    service: &SchoolService,
    request: &HttpRequest,
    school_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.reset_school(school_id).await {
        Ok(deleted) => {
            info!(
                "School {} reset by user {}: {} users, {} classes removed",
                school_id, current.id, deleted.users, deleted.classes
            );
            remove_stored_files(Path::new(&AppConfig::get().upload.dir), &deleted.stored_files)
                .await;
            if deleted.users > 0
                && let Some(cache) = get_cache(request)
            {
                cache.invalidate_all().await;
            }
            audit(
                &storage,
                request,
                NewAuditLog::new("school.reset", "school")
                    .school(Some(school_id))
                    .actor(current.id, current.school_id)
                    .target(school_id)
                    .details(serde_json::to_value(&deleted).unwrap_or_default()),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                SchoolResetResponse { school_id, deleted },
                "School reset",
            )))
        }
        Err(SchoolHubError::NotFound(_)) => {
            Ok(not_found(ErrorCode::SchoolNotFound, "School not found"))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
