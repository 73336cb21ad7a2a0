use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 站内信
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "message.ts")]
pub struct Message {
    pub id: i64,
    pub school_id: Option<i64>,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub subject: String,
    pub body: String,
    pub is_read: bool,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub sender_deleted: bool,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub recipient_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 信箱方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mailbox {
    Inbox,
    Sent,
}
