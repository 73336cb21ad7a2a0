use serde::Deserialize;
use ts_rs::TS;

use super::entities::InvoiceStatus;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "invoice.ts")]
pub struct GenerateInvoiceRequest {
    pub school_id: i64,
    /// YYYY-MM
    pub period: String,
    /// 默认 30 天
    pub due_in_days: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "invoice.ts")]
pub struct PayInvoiceRequest {
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "invoice.ts")]
pub struct InvoiceListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub school_id: Option<i64>,
    pub status: Option<InvoiceStatus>,
    pub period: Option<String>,
}

/// 存储层写入账单所需数据
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub school_id: i64,
    pub invoice_number: String,
    pub period: String,
    pub student_count: i32,
    pub teacher_count: i32,
    pub amount: f64,
    pub due_date: i64,
}
