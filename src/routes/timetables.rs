use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::entities::AccessRole;
use crate::models::timetables::requests::{
    CreateTimetableRequest, TimetableListParams, UpdateTimetableRequest,
};
use crate::services::TimetableService;
use crate::utils::SafeIDI64;

// 懒加载的全局 TimetableService 实例
static TIMETABLE_SERVICE: Lazy<TimetableService> = Lazy::new(TimetableService::new_lazy);

// 排课：管理员或协调员
const SCHEDULERS: &[AccessRole] = &[AccessRole::Admin, AccessRole::COORDINATOR];

pub async fn list_entries(
    req: HttpRequest,
    query: web::Query<TimetableListParams>,
) -> ActixResult<HttpResponse> {
    TIMETABLE_SERVICE.list_entries(&req, query.into_inner()).await
}

pub async fn create_entry(
    req: HttpRequest,
    entry_data: web::Json<CreateTimetableRequest>,
) -> ActixResult<HttpResponse> {
    TIMETABLE_SERVICE
        .create_entry(&req, entry_data.into_inner())
        .await
}

pub async fn update_entry(
    req: HttpRequest,
    entry_id: SafeIDI64,
    update_data: web::Json<UpdateTimetableRequest>,
) -> ActixResult<HttpResponse> {
    TIMETABLE_SERVICE
        .update_entry(&req, entry_id.0, update_data.into_inner())
        .await
}

pub async fn delete_entry(req: HttpRequest, entry_id: SafeIDI64) -> ActixResult<HttpResponse> {
    TIMETABLE_SERVICE.delete_entry(&req, entry_id.0).await
}

// 配置路由
pub fn configure_timetable_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/timetables")
            .wrap(middlewares::RouteGuard)
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("").route(web::get().to(list_entries)).route(
                    web::post()
                        .to(create_entry)
                        .wrap(middlewares::RequireRole::new_any(SCHEDULERS)),
                ),
            )
            .service(
                web::resource("/{id}")
                    .wrap(middlewares::RequireRole::new_any(SCHEDULERS))
                    .route(web::put().to(update_entry))
                    .route(web::delete().to(delete_entry)),
            ),
    );
}
