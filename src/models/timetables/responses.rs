use serde::Serialize;
use ts_rs::TS;

use super::entities::TimetableEntry;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "timetable.ts")]
pub struct TimetableEntryResponse {
    pub entry: TimetableEntry,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "timetable.ts")]
pub struct TimetableListResponse {
    pub items: Vec<TimetableEntry>,
}
