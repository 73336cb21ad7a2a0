use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct CreateGradeRequest {
    pub student_id: i64,
    pub subject: String,
    pub term: String,
    pub score: f64,
    pub max_score: f64,
    pub assignment_id: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct UpdateGradeRequest {
    pub subject: Option<String>,
    pub term: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub student_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub subject: Option<String>,
    pub term: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeSummaryParams {
    pub student_id: Option<i64>,
    pub term: Option<String>,
}

/// 存储层写入成绩所需数据（等级已计算）
#[derive(Debug, Clone)]
pub struct NewGrade {
    pub school_id: i64,
    pub student_id: i64,
    pub teacher_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub subject: String,
    pub term: String,
    pub score: f64,
    pub max_score: f64,
    pub comment: Option<String>,
}

/// 存储层更新成绩（分数变化时等级会重新计算）
#[derive(Debug, Clone, Default)]
pub struct GradeUpdate {
    pub subject: Option<String>,
    pub term: Option<String>,
    pub score: f64,
    pub max_score: f64,
    pub comment: Option<String>,
}
