use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::debug;

use super::{AttendanceTx, Registration, Store, StoreError, is_duplicate_key};
use crate::model::{
    attendance::{AttendanceRecord, NewAttendance},
    user::{NewUser, User},
};

const USER_COLUMNS: &str = "id, email, password, name, employee_id, created_at";
const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, employee_name, date, start_time, end_time, location, duration";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

/// Inserts the employee or, when the name exists, points `LAST_INSERT_ID()`
/// at the existing row. Concurrent signups with the same new name queue on
/// the unique key; a locking read of a missing name would gap-lock and deadlock.
const RESOLVE_EMPLOYEE: &str = r#"
    INSERT INTO employees (name) VALUES (?)
    ON DUPLICATE KEY UPDATE id = LAST_INSERT_ID(id)
"#;

async fn resolve_employee(tx: &mut Transaction<'static, MySql>, name: &str) -> Result<u64, StoreError> {
    let done = sqlx::query(RESOLVE_EMPLOYEE)
        .bind(name)
        .execute(&mut **tx)
        .await?;

    debug!(employee_id = done.last_insert_id(), "Employee resolved on signup");
    Ok(done.last_insert_id())
}

#[async_trait]
impl Store for MySqlStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        // mysql reports EXISTS as a BIGINT
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn register_user(&self, new_user: NewUser) -> Result<Registration, StoreError> {
        let mut tx = self.pool.begin().await?;

        let employee_id = resolve_employee(&mut tx, &new_user.name).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (email, password, name, employee_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(employee_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::DuplicateEmail
            } else {
                e.into()
            }
        })?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(inserted.last_insert_id())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Registration { user, employee_id })
    }

    async fn update_password_hash(&self, user_id: u64, hash: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn lock_employee(
        &self,
        employee_id: u64,
    ) -> Result<Option<Box<dyn AttendanceTx>>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // row lock serialises concurrent toggles for the same employee
        let name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM employees WHERE id = ? FOR UPDATE",
        )
        .bind(employee_id)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(name.map(|employee_name| {
            Box::new(MySqlAttendanceTx {
                tx,
                employee_id,
                employee_name,
            }) as Box<dyn AttendanceTx>
        }))
    }
}

struct MySqlAttendanceTx {
    tx: Transaction<'static, MySql>,
    employee_id: u64,
    employee_name: String,
}

#[async_trait]
impl AttendanceTx for MySqlAttendanceTx {
    fn employee_name(&self) -> &str {
        &self.employee_name
    }

    async fn find_open_at(
        &mut self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS} FROM attendance
            WHERE employee_id = ? AND date = ? AND location = ? AND end_time IS NULL
            LIMIT 1
            "#
        ))
        .bind(self.employee_id)
        .bind(date)
        .bind(location)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn find_open_elsewhere(
        &mut self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS} FROM attendance
            WHERE employee_id = ? AND date = ? AND location <> ? AND end_time IS NULL
            LIMIT 1
            "#
        ))
        .bind(self.employee_id)
        .bind(date)
        .bind(location)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn close(
        &mut self,
        record_id: u64,
        end_time: NaiveTime,
        duration: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE attendance
            SET end_time = ?, duration = ?
            WHERE id = ? AND end_time IS NULL
            "#,
        )
        .bind(end_time)
        .bind(duration)
        .bind(record_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn open(&mut self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO attendance
            (employee_id, employee_name, date, start_time, location)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(&record.employee_name)
        .bind(record.date)
        .bind(record.start_time)
        .bind(&record.location)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::OpenSessionExists(record.employee_id)
            } else {
                e.into()
            }
        })?;

        Ok(AttendanceRecord {
            id: inserted.last_insert_id(),
            employee_id: record.employee_id,
            employee_name: record.employee_name,
            date: record.date,
            start_time: record.start_time,
            end_time: None,
            location: record.location,
            duration: None,
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
