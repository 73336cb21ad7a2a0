use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::ReportService;
use crate::services::reports::ReportParams;

// 懒加载的全局 ReportService 实例
static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn overview(
    req: HttpRequest,
    query: web::Query<ReportParams>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.overview(&req, query.into_inner()).await
}

// 配置路由（管理员或校长）
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reports")
            .wrap(middlewares::RouteGuard)
            .wrap(middlewares::RequireJWT)
            .route("/overview", web::get().to(overview)),
    );
}
