use super::entities::{TeacherSubdivision, UserProfile, UserRole};
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// 仅总管理员可指定
    pub school_id: Option<i64>,
    pub role: Option<UserRole>,
    pub subdivision: Option<TeacherSubdivision>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

// 用户创建请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct CreateUserRequest {
    /// 总管理员创建时必填，学校管理员忽略
    pub school_id: Option<i64>,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub profile: UserProfile,
}

// 用户更新请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// 管理员重置密码（存储层收到的是哈希）
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub avatar_url: Option<String>,
    pub profile: Option<UserProfile>,
}

/// 存储层写入新用户所需的数据（密码已哈希）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub school_id: Option<i64>,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub profile: UserProfile,
}

// 导入 / 导出时指定学校（仅总管理员需要）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserSchoolParams {
    pub school_id: Option<i64>,
}
