use serde::{Deserialize, Serialize};

use crate::models::users::entities::{TeacherSubdivision, User, UserRole};

/// 登录会话
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 访问控制角色：教师可按细分角色进一步限定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRole {
    HeadAdmin,
    Admin,
    /// 任意细分的教师
    AnyTeacher,
    Teacher(TeacherSubdivision),
    Student,
}

impl AccessRole {
    pub const DIRECTOR: AccessRole = AccessRole::Teacher(TeacherSubdivision::Director);
    pub const COORDINATOR: AccessRole = AccessRole::Teacher(TeacherSubdivision::Coordinator);
    pub const CLASS_TEACHER: AccessRole = AccessRole::Teacher(TeacherSubdivision::ClassTeacher);
    pub const SUBJECT_TEACHER: AccessRole =
        AccessRole::Teacher(TeacherSubdivision::SubjectTeacher);

    /// 全部角色
    pub const EVERYONE: &'static [AccessRole] = &[
        AccessRole::HeadAdmin,
        AccessRole::Admin,
        AccessRole::AnyTeacher,
        AccessRole::Student,
    ];

    pub fn matches(&self, role: UserRole, subdivision: Option<TeacherSubdivision>) -> bool {
        match self {
            AccessRole::HeadAdmin => role == UserRole::HeadAdmin,
            AccessRole::Admin => role == UserRole::Admin,
            AccessRole::AnyTeacher => role == UserRole::Teacher,
            AccessRole::Teacher(required) => {
                role == UserRole::Teacher && subdivision == Some(*required)
            }
            AccessRole::Student => role == UserRole::Student,
        }
    }
}

impl std::fmt::Display for AccessRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessRole::HeadAdmin => f.write_str("head_admin"),
            AccessRole::Admin => f.write_str("admin"),
            AccessRole::AnyTeacher => f.write_str("teacher"),
            AccessRole::Teacher(sub) => write!(f, "teacher:{sub}"),
            AccessRole::Student => f.write_str("student"),
        }
    }
}

/// 已认证的请求主体，由 RequireJWT 放入请求扩展
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub school_id: Option<i64>,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub subdivision: Option<TeacherSubdivision>,
    /// 学生所在班级
    pub class_id: Option<i64>,
    pub session_token: String,
}

impl AuthUser {
    pub fn from_user(
        user: &User,
        subdivision: Option<TeacherSubdivision>,
        class_id: Option<i64>,
        session_token: &str,
    ) -> Self {
        Self {
            id: user.id,
            school_id: user.school_id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            subdivision,
            class_id,
            session_token: session_token.to_string(),
        }
    }

    pub fn is_head_admin(&self) -> bool {
        self.role == UserRole::HeadAdmin
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    /// 是否满足任一访问角色
    pub fn has_any(&self, roles: &[AccessRole]) -> bool {
        roles.iter().any(|r| r.matches(self.role, self.subdivision))
    }

    /// 总管理员可以访问任意学校，其余角色只能访问所属学校
    pub fn can_access_school(&self, school_id: i64) -> bool {
        self.is_head_admin() || self.school_id == Some(school_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(role: UserRole, subdivision: Option<TeacherSubdivision>) -> AuthUser {
        AuthUser {
            id: 1,
            school_id: Some(1),
            email: "x@school.edu".to_string(),
            full_name: "X".to_string(),
            role,
            subdivision,
            class_id: None,
            session_token: "t".to_string(),
        }
    }

    #[test]
    fn test_access_role_matching() {
        let coordinator = auth_user(UserRole::Teacher, Some(TeacherSubdivision::Coordinator));
        assert!(coordinator.has_any(&[AccessRole::AnyTeacher]));
        assert!(coordinator.has_any(&[AccessRole::COORDINATOR]));
        assert!(!coordinator.has_any(&[AccessRole::DIRECTOR, AccessRole::Admin]));

        let admin = auth_user(UserRole::Admin, None);
        assert!(admin.has_any(AccessRole::EVERYONE));
        assert!(!admin.has_any(&[AccessRole::HeadAdmin]));
        assert_eq!(AccessRole::CLASS_TEACHER.to_string(), "teacher:class_teacher");
    }

    #[test]
    fn test_school_scope() {
        let admin = auth_user(UserRole::Admin, None);
        assert!(admin.can_access_school(1));
        assert!(!admin.can_access_school(2));
        let head = AuthUser {
            school_id: None,
            ..auth_user(UserRole::HeadAdmin, None)
        };
        assert!(head.can_access_school(2));
    }
}
