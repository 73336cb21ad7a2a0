use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{InvoiceService, visible_invoice};
use crate::models::{ApiResponse, invoices::responses::InvoiceResponse};
use crate::services::common::current_user;

pub async fn get_invoice(
    service: &InvoiceService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match visible_invoice(&storage, &current, id).await {
        Ok(invoice) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            InvoiceResponse { invoice },
            "OK",
        ))),
        Err(resp) => Ok(resp),
    }
}
