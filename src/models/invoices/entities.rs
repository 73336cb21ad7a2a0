use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::define_string_enum;

define_string_enum! {
    /// 账单状态：pending → paid | cancelled
    #[ts(export, export_to = "invoice.ts")]
    pub enum InvoiceStatus {
        Pending => "pending",
        Paid => "paid",
        Cancelled => "cancelled",
    }
}

impl InvoiceStatus {
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Pending, InvoiceStatus::Paid)
                | (InvoiceStatus::Pending, InvoiceStatus::Cancelled)
        )
    }

    /// 可以迁移到 `next` 的全部状态
    pub fn predecessors_of(next: InvoiceStatus) -> Vec<InvoiceStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }
}

/// 账单金额 = 学生数 × 学生单价 + 教师数 × 教师单价，保留两位小数
pub fn invoice_amount(students: i64, teachers: i64, student_rate: f64, teacher_rate: f64) -> f64 {
    let raw = students as f64 * student_rate + teachers as f64 * teacher_rate;
    (raw * 100.0).round() / 100.0
}

/// 账单号：INV-{YYYYMM}-{学校代码}-{随机后缀}
pub fn invoice_number(period: &str, school_code: &str, suffix: &str) -> String {
    format!(
        "INV-{}-{}-{}",
        period.replace('-', ""),
        school_code.to_uppercase(),
        suffix
    )
}

// 账单实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "invoice.ts")]
pub struct Invoice {
    pub id: i64,
    pub school_id: i64,
    pub invoice_number: String,
    /// YYYY-MM
    pub period: String,
    pub student_count: i32,
    pub teacher_count: i32,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
    pub payment_reference: Option<String>,
    /// 未支付且已过期
    pub is_overdue: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Invoice {
    pub fn compute_overdue(status: InvoiceStatus, due_date: i64, now: i64) -> bool {
        status == InvoiceStatus::Pending && due_date < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Cancelled));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Cancelled));
        assert!(!InvoiceStatus::Cancelled.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Pending));
        assert_eq!(
            InvoiceStatus::predecessors_of(InvoiceStatus::Cancelled),
            vec![InvoiceStatus::Pending]
        );
        assert!(InvoiceStatus::predecessors_of(InvoiceStatus::Pending).is_empty());
    }

    #[test]
    fn test_amount() {
        assert_eq!(invoice_amount(120, 10, 2.5, 5.0), 350.0);
        assert_eq!(invoice_amount(0, 0, 2.5, 5.0), 0.0);
        assert_eq!(invoice_amount(3, 0, 0.1, 0.0), 0.3);
    }

    #[test]
    fn test_number_format() {
        assert_eq!(
            invoice_number("2025-03", "gvhs", "A1B2"),
            "INV-202503-GVHS-A1B2"
        );
    }

    #[test]
    fn test_overdue() {
        assert!(Invoice::compute_overdue(InvoiceStatus::Pending, 100, 200));
        assert!(!Invoice::compute_overdue(InvoiceStatus::Paid, 100, 200));
        assert!(!Invoice::compute_overdue(InvoiceStatus::Pending, 300, 200));
    }
}
