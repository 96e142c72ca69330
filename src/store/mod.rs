//! Persistence seam. Handlers and the toggle engine only see these traits;
//! `MySqlStore` backs production and `MemoryStore` backs the tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::model::{
    attendance::{AttendanceRecord, NewAttendance},
    user::{NewUser, User},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[cfg(test)]
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email already registered")]
    DuplicateEmail,

    /// The one-open-session-per-day key rejected an insert.
    #[error("employee {0} already has an open session today")]
    OpenSessionExists(u64),
}

/// Result of a signup: the stored user plus the employee it was linked to.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub employee_id: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Links the user to the employee named exactly `user.name`, creating
    /// that employee first when the roster has none.
    async fn register_user(&self, user: NewUser) -> Result<Registration, StoreError>;

    async fn update_password_hash(&self, user_id: u64, hash: &str) -> Result<(), StoreError>;

    /// Opens a unit of work that holds the employee exclusively until it is
    /// committed or dropped. `None` when the employee does not exist.
    async fn lock_employee(
        &self,
        employee_id: u64,
    ) -> Result<Option<Box<dyn AttendanceTx>>, StoreError>;
}

/// Attendance reads and writes for a single locked employee.
/// Dropping without [`AttendanceTx::commit`] discards every change.
#[async_trait]
pub trait AttendanceTx: Send {
    fn employee_name(&self) -> &str;

    async fn find_open_at(
        &mut self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Any open session on `date` at a location other than `location`.
    async fn find_open_elsewhere(
        &mut self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn close(
        &mut self,
        record_id: u64,
        end_time: NaiveTime,
        duration: &str,
    ) -> Result<(), StoreError>;

    async fn open(&mut self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// SQLSTATE 23000 covers unique and foreign-key violations in MySQL.
pub(crate) fn is_duplicate_key(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}
