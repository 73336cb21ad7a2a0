use serde::Serialize;
use ts_rs::TS;

/// 学校概览
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct ReportOverview {
    pub school_id: i64,
    pub students: i64,
    pub teachers: i64,
    pub classes: i64,
    pub active_assignments: i64,
    pub pending_invoices: i64,
    /// 全校成绩平均百分比，无成绩时为 None
    pub average_grade_percentage: Option<f64>,
}
