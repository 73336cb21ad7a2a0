//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。
//! 时间字段统一存储为 Unix 秒。

pub mod prelude;

pub mod admin_profiles;
pub mod assignments;
pub mod audit_logs;
pub mod classes;
pub mod files;
pub mod grades;
pub mod invoices;
pub mod messages;
pub mod notifications;
pub mod schools;
pub mod sessions;
pub mod student_profiles;
pub mod teacher_profiles;
pub mod timetables;
pub mod users;

use chrono::{DateTime, Utc};

pub(crate) fn to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

pub(crate) fn to_datetime_opt(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
}
