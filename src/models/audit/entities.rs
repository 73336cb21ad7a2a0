use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 审计日志
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "audit.ts")]
pub struct AuditLog {
    pub id: i64,
    pub school_id: Option<i64>,
    pub actor_id: Option<i64>,
    /// 形如 `school.create`、`user.delete`
    pub action: String,
    pub target_type: String,
    pub target_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 待写入的审计记录
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub school_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
}

impl NewAuditLog {
    pub fn new(action: &str, target_type: &str) -> Self {
        Self {
            school_id: None,
            actor_id: None,
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id: None,
            details: None,
            ip_address: None,
        }
    }

    /// 记录操作者，学校默认取操作者所属学校
    pub fn actor(mut self, actor_id: i64, school_id: Option<i64>) -> Self {
        self.actor_id = Some(actor_id);
        if self.school_id.is_none() {
            self.school_id = school_id;
        }
        self
    }

    pub fn school(mut self, school_id: Option<i64>) -> Self {
        self.school_id = school_id;
        self
    }

    pub fn target(mut self, target_id: i64) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_explicit_school() {
        let entry = NewAuditLog::new("school.delete", "school")
            .school(None)
            .actor(1, None)
            .target(5);
        assert_eq!(entry.school_id, None);
        assert_eq!(entry.target_id, Some(5));

        let entry = NewAuditLog::new("user.create", "user")
            .school(Some(3))
            .actor(1, Some(9));
        assert_eq!(entry.school_id, Some(3));

        let entry = NewAuditLog::new("user.create", "user").actor(1, Some(9));
        assert_eq!(entry.school_id, Some(9));
    }
}
