pub mod generate;
pub mod get;
pub mod list;
pub mod status;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::{
    ErrorCode,
    auth::entities::AuthUser,
    invoices::{
        entities::{Invoice, InvoiceStatus},
        requests::{GenerateInvoiceRequest, InvoiceListParams, PayInvoiceRequest},
    },
};
use crate::services::common::{error_response, not_found};
use crate::storage::Storage;

pub struct InvoiceService {
    storage: Option<Arc<dyn Storage>>,
}

impl InvoiceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn generate_invoice(
        &self,
        request: &HttpRequest,
        req: GenerateInvoiceRequest,
    ) -> ActixResult<HttpResponse> {
        generate::generate_invoice(self, request, req).await
    }

    pub async fn list_invoices(
        &self,
        request: &HttpRequest,
        query: InvoiceListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_invoices(self, request, query).await
    }

    pub async fn get_invoice(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        get::get_invoice(self, request, id).await
    }

    pub async fn pay_invoice(
        &self,
        request: &HttpRequest,
        id: i64,
        req: PayInvoiceRequest,
    ) -> ActixResult<HttpResponse> {
        status::transition(
            self,
            request,
            id,
            InvoiceStatus::Paid,
            req.payment_reference,
        )
        .await
    }

    pub async fn cancel_invoice(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        status::transition(self, request, id, InvoiceStatus::Cancelled, None).await
    }
}

/// 读取当前用户可见的账单，跨学校视为不存在
pub(crate) async fn visible_invoice(
    storage: &Arc<dyn Storage>,
    current: &AuthUser,
    id: i64,
) -> Result<Invoice, HttpResponse> {
    match storage.get_invoice_by_id(id).await {
        Ok(Some(invoice)) if current.can_access_school(invoice.school_id) => Ok(invoice),
        Ok(_) => Err(not_found(ErrorCode::InvoiceNotFound, "Invoice not found")),
        Err(e) => Err(error_response(&e)),
    }
}
