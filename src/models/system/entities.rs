use serde::Serialize;
use ts_rs::TS;

/// 健康检查状态
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "system.ts")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub database: bool,
}
