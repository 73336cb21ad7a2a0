use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::path::Path;
use tracing::info;

use super::SchoolService;
use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode, audit::entities::NewAuditLog};
use crate::services::common::{audit, current_user, error_response, get_cache, not_found};
use crate::services::files::remove_stored_files;

pub async fn delete_school(
    service: &SchoolService,
    request: &HttpRequest,
    school_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.delete_school(school_id).await {
        Ok(Some(stored_files)) => {
            info!("School {} deleted by user {}", school_id, current.id);
            remove_stored_files(Path::new(&AppConfig::get().upload.dir), &stored_files).await;
            // 会话已随用户删除，清空缓存中残留的登录态
            if let Some(cache) = get_cache(request) {
                cache.invalidate_all().await;
            }
            // 学校已不存在，审计记录不挂学校
            audit(
                &storage,
                request,
                NewAuditLog::new("school.delete", "school")
                    .school(None)
                    .actor(current.id, None)
                    .target(school_id),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("School deleted")))
        }
        Ok(None) => Ok(not_found(ErrorCode::SchoolNotFound, "School not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
