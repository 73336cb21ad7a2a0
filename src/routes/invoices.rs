use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::entities::AccessRole;
use crate::models::invoices::requests::{
    GenerateInvoiceRequest, InvoiceListParams, PayInvoiceRequest,
};
use crate::services::InvoiceService;
use crate::utils::SafeIDI64;

// 懒加载的全局 InvoiceService 实例
static INVOICE_SERVICE: Lazy<InvoiceService> = Lazy::new(InvoiceService::new_lazy);

pub async fn generate_invoice(
    req: HttpRequest,
    invoice_data: web::Json<GenerateInvoiceRequest>,
) -> ActixResult<HttpResponse> {
    INVOICE_SERVICE
        .generate_invoice(&req, invoice_data.into_inner())
        .await
}

pub async fn list_invoices(
    req: HttpRequest,
    query: web::Query<InvoiceListParams>,
) -> ActixResult<HttpResponse> {
    INVOICE_SERVICE.list_invoices(&req, query.into_inner()).await
}

pub async fn get_invoice(req: HttpRequest, invoice_id: SafeIDI64) -> ActixResult<HttpResponse> {
    INVOICE_SERVICE.get_invoice(&req, invoice_id.0).await
}

pub async fn pay_invoice(
    req: HttpRequest,
    invoice_id: SafeIDI64,
    pay_data: Option<web::Json<PayInvoiceRequest>>,
) -> ActixResult<HttpResponse> {
    let pay_data = pay_data.map(|d| d.into_inner()).unwrap_or_default();
    INVOICE_SERVICE
        .pay_invoice(&req, invoice_id.0, pay_data)
        .await
}

pub async fn cancel_invoice(req: HttpRequest, invoice_id: SafeIDI64) -> ActixResult<HttpResponse> {
    INVOICE_SERVICE.cancel_invoice(&req, invoice_id.0).await
}

// 配置路由
pub fn configure_invoice_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/invoices")
            .wrap(middlewares::RouteGuard)
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/generate").route(
                    web::post()
                        .to(generate_invoice)
                        .wrap(middlewares::RequireRole::new(AccessRole::HeadAdmin)),
                ),
            )
            .route("", web::get().to(list_invoices))
            .route("/{id}", web::get().to(get_invoice))
            .route("/{id}/pay", web::post().to(pay_invoice))
            .service(
                web::resource("/{id}/cancel").route(
                    web::post()
                        .to(cancel_invoice)
                        .wrap(middlewares::RequireRole::new(AccessRole::HeadAdmin)),
                ),
            ),
    );
}
