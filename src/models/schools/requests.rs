use serde::Deserialize;
use ts_rs::TS;

use super::entities::SchoolStatus;

// 创建学校请求，同时创建首个学校管理员
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct CreateSchoolRequest {
    pub name: String,
    /// 不填则自动生成
    pub code: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub student_rate: f64,
    #[serde(default)]
    pub teacher_rate: f64,
    pub admin_full_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct UpdateSchoolRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<SchoolStatus>,
    pub student_rate: Option<f64>,
    pub teacher_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
    pub status: Option<SchoolStatus>,
}

/// 存储层写入学校所需数据
#[derive(Debug, Clone)]
pub struct NewSchool {
    pub name: String,
    pub code: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub student_rate: f64,
    pub teacher_rate: f64,
}
