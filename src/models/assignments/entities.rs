use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::define_string_enum;

define_string_enum! {
    /// 作业状态：draft → active → closed
    #[ts(export, export_to = "assignment.ts")]
    pub enum AssignmentStatus {
        Draft => "draft",
        Active => "active",
        Closed => "closed",
    }
}

impl AssignmentStatus {
    /// 状态只允许单向前进
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        matches!(
            (self, next),
            (AssignmentStatus::Draft, AssignmentStatus::Active)
                | (AssignmentStatus::Active, AssignmentStatus::Closed)
        )
    }

    pub fn predecessors_of(next: AssignmentStatus) -> Vec<AssignmentStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }

    /// 学生可见的状态
    pub fn visible_to_students() -> &'static [AssignmentStatus] {
        &[AssignmentStatus::Active, AssignmentStatus::Closed]
    }
}

// 作业实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct Assignment {
    pub id: i64,
    pub school_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub subject: String,
    pub title: String,
    pub description: Option<String>,
    pub attachment_token: Option<String>,
    pub max_score: f64,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub status: AssignmentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(AssignmentStatus::Draft.can_transition_to(AssignmentStatus::Active));
        assert!(AssignmentStatus::Active.can_transition_to(AssignmentStatus::Closed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!AssignmentStatus::Draft.can_transition_to(AssignmentStatus::Closed));
        assert!(!AssignmentStatus::Closed.can_transition_to(AssignmentStatus::Active));
        assert!(!AssignmentStatus::Active.can_transition_to(AssignmentStatus::Draft));
        assert!(!AssignmentStatus::Active.can_transition_to(AssignmentStatus::Active));
        assert!(AssignmentStatus::predecessors_of(AssignmentStatus::Draft).is_empty());
        assert_eq!(
            AssignmentStatus::predecessors_of(AssignmentStatus::Closed),
            vec![AssignmentStatus::Active]
        );
    }
}
