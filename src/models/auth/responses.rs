use crate::models::users::entities::UserDetail;
use serde::Serialize;
use ts_rs::TS;

// 登录响应，令牌本身只放在 HttpOnly cookie 中
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct LoginResponse {
    pub user: UserDetail,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct MeResponse {
    pub user: UserDetail,
}
