use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One session of an employee at a location on a given day.
/// `end_time == None` means the session is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub location: String,
    pub duration: Option<String>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub location: String,
}
