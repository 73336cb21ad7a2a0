use serde::Serialize;
use ts_rs::TS;

use super::entities::Invoice;
use crate::models::common::PaginationInfo;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "invoice.ts")]
pub struct InvoiceResponse {
    pub invoice: Invoice,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "invoice.ts")]
pub struct InvoiceListResponse {
    pub items: Vec<Invoice>,
    pub pagination: PaginationInfo,
}
