use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::define_string_enum;

define_string_enum! {
    #[ts(export, export_to = "school.ts")]
    pub enum SchoolStatus {
        Active => "active",
        Suspended => "suspended",
    }
}

/// 学校（租户）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct School {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: SchoolStatus,
    /// 每名学生每期费用
    pub student_rate: f64,
    /// 每名教师每期费用
    pub teacher_rate: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 学校人数统计
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolStats {
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
    pub classes: i64,
}

/// 重置学校时删除的各类记录数
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolResetSummary {
    pub users: u64,
    pub classes: u64,
    pub assignments: u64,
    pub grades: u64,
    pub timetables: u64,
    pub messages: u64,
    pub notifications: u64,
    /// 被删除用户上传文件的磁盘文件名，仅供服务层清理
    #[serde(skip)]
    #[ts(skip)]
    pub stored_files: Vec<String>,
}
