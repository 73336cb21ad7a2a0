use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "audit.ts")]
pub struct AuditLogListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// 仅总管理员可指定
    pub school_id: Option<i64>,
    pub action: Option<String>,
    pub actor_id: Option<i64>,
}
