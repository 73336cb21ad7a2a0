use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::define_string_enum;

define_string_enum! {
    /// 用户角色
    #[ts(export, export_to = "user.ts")]
    pub enum UserRole {
        HeadAdmin => "head_admin",
        Admin => "admin",
        Teacher => "teacher",
        Student => "student",
    }
}

impl UserRole {
    /// 学校级管理角色（不含总管理员）
    pub fn is_school_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::HeadAdmin | UserRole::Admin | UserRole::Teacher)
    }
}

define_string_enum! {
    /// 教师细分角色
    #[ts(export, export_to = "user.ts")]
    pub enum TeacherSubdivision {
        Director => "director",
        Coordinator => "coordinator",
        ClassTeacher => "class_teacher",
        SubjectTeacher => "subject_teacher",
    }
}

/// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct User {
    pub id: i64,
    pub school_id: Option<i64>,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub login_attempts: i32,
    pub locked_until: Option<chrono::DateTime<chrono::Utc>>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 角色资料（管理员 / 教师 / 学生字段合并，按角色取用）
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "user.ts")]
pub struct UserProfile {
    // 管理员
    pub phone: Option<String>,
    pub title: Option<String>,
    // 教师
    pub subdivision: Option<TeacherSubdivision>,
    pub specialty: Option<String>,
    pub employee_number: Option<String>,
    // 学生
    pub class_id: Option<i64>,
    pub admission_number: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
}

/// 用户及其角色资料
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub user: User,
    pub profile: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_strings() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), *role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
        assert_eq!(UserRole::HeadAdmin.to_string(), "head_admin");
    }

    #[test]
    fn test_subdivision_serde() {
        let json = serde_json::to_string(&TeacherSubdivision::ClassTeacher).unwrap();
        assert_eq!(json, "\"class_teacher\"");
        let parsed: TeacherSubdivision = serde_json::from_str("\"director\"").unwrap();
        assert_eq!(parsed, TeacherSubdivision::Director);
        assert!(serde_json::from_str::<TeacherSubdivision>("\"janitor\"").is_err());
    }
}
