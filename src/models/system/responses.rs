use serde::Serialize;
use ts_rs::TS;

use super::entities::HealthStatus;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "system.ts")]
pub struct HealthResponse {
    pub health: HealthStatus,
}
