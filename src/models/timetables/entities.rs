use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课程表条目
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "timetable.ts")]
pub struct TimetableEntry {
    pub id: i64,
    pub school_id: i64,
    pub class_id: i64,
    pub teacher_id: Option<i64>,
    pub subject: String,
    /// 1 = 周一 … 7 = 周日
    pub day_of_week: i32,
    pub period: i32,
    /// HH:MM
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
