use serde::Deserialize;
use ts_rs::TS;

use super::entities::AssignmentStatus;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct CreateAssignmentRequest {
    pub class_id: i64,
    pub subject: String,
    pub title: String,
    pub description: Option<String>,
    /// 通过 /files 上传后得到的下载令牌
    pub attachment_token: Option<String>,
    pub max_score: Option<f64>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct UpdateAssignmentRequest {
    pub subject: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub attachment_token: Option<String>,
    pub max_score: Option<f64>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub class_id: Option<i64>,
    pub status: Option<AssignmentStatus>,
    pub subject: Option<String>,
}

/// 存储层查询条件（由服务层按角色填充）
#[derive(Debug, Clone, Default)]
pub struct AssignmentListQuery {
    pub school_id: Option<i64>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub statuses: Option<Vec<AssignmentStatus>>,
    pub subject: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// 存储层写入作业所需数据
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub school_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub subject: String,
    pub title: String,
    pub description: Option<String>,
    pub attachment_token: Option<String>,
    pub max_score: f64,
    pub due_date: Option<i64>,
}
