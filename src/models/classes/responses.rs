use serde::Serialize;
use ts_rs::TS;

use super::entities::Class;
use crate::models::users::entities::User;
use crate::models::common::PaginationInfo;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassResponse {
    pub class: Class,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassListResponse {
    pub items: Vec<Class>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassStudentsResponse {
    pub class_id: i64,
    pub items: Vec<User>,
}
