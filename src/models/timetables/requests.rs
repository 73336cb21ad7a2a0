use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "timetable.ts")]
pub struct CreateTimetableRequest {
    pub class_id: i64,
    pub teacher_id: Option<i64>,
    pub subject: String,
    pub day_of_week: i32,
    pub period: i32,
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "timetable.ts")]
pub struct UpdateTimetableRequest {
    pub teacher_id: Option<i64>,
    pub subject: Option<String>,
    pub day_of_week: Option<i32>,
    pub period: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "timetable.ts")]
pub struct TimetableListParams {
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub day_of_week: Option<i32>,
}

/// 存储层写入条目所需数据（更新时也使用合并后的完整值）
#[derive(Debug, Clone)]
pub struct TimetableSlot {
    pub school_id: i64,
    pub class_id: i64,
    pub teacher_id: Option<i64>,
    pub subject: String,
    pub day_of_week: i32,
    pub period: i32,
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
}
