use serde::Serialize;
use ts_rs::TS;

use super::entities::{School, SchoolResetSummary, SchoolStats};
use crate::models::common::PaginationInfo;
use crate::models::users::entities::User;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolResponse {
    pub school: School,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolDetailResponse {
    pub school: School,
    pub stats: SchoolStats,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct CreateSchoolResponse {
    pub school: School,
    pub admin: User,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolListResponse {
    pub items: Vec<School>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "school.ts")]
pub struct SchoolResetResponse {
    pub school_id: i64,
    pub deleted: SchoolResetSummary,
}
