use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveTime};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{AttendanceTx, Registration, Store, StoreError};
use crate::model::{
    attendance::{AttendanceRecord, NewAttendance},
    employee::Employee,
    user::{NewUser, User},
};

#[derive(Debug, Default, Clone)]
struct State {
    users: Vec<User>,
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRecord>,
}

/// Process-local store with the same semantics as the MySQL schema.
/// A single mutex stands in for row locks, so units of work are fully serialised.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a roster entry, as an operator would before anyone signs up.
    pub async fn seed_employee(&self, name: &str) -> u64 {
        let mut state = self.state.lock().await;
        let id = state.employees.len() as u64 + 1;
        state.employees.push(Employee {
            id,
            name: name.to_string(),
            created_at: Local::now().naive_local(),
        });
        id
    }

    pub async fn attendance(&self) -> Vec<AttendanceRecord> {
        self.state.lock().await.attendance.clone()
    }

    pub async fn employees(&self) -> Vec<Employee> {
        self.state.lock().await.employees.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.users.iter().any(|u| u.email == email))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn register_user(&self, new_user: NewUser) -> Result<Registration, StoreError> {
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Local::now().naive_local();
        let employee_id = match state.employees.iter().find(|e| e.name == new_user.name) {
            Some(employee) => employee.id,
            None => {
                let id = state.employees.len() as u64 + 1;
                state.employees.push(Employee {
                    id,
                    name: new_user.name.clone(),
                    created_at: now,
                });
                id
            }
        };

        let user = User {
            id: state.users.len() as u64 + 1,
            email: new_user.email,
            password: new_user.password_hash,
            name: new_user.name,
            employee_id: Some(employee_id),
            created_at: now,
        };
        state.users.push(user.clone());

        Ok(Registration { user, employee_id })
    }

    async fn update_password_hash(&self, user_id: u64, hash: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.password = hash.to_string();
        }
        Ok(())
    }

    async fn lock_employee(
        &self,
        employee_id: u64,
    ) -> Result<Option<Box<dyn AttendanceTx>>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;

        let Some(employee_name) = guard
            .employees
            .iter()
            .find(|e| e.id == employee_id)
            .map(|e| e.name.clone())
        else {
            return Ok(None);
        };

        let staged = guard.attendance.clone();
        Ok(Some(Box::new(MemoryAttendanceTx {
            guard,
            staged,
            employee_id,
            employee_name,
        })))
    }
}

struct MemoryAttendanceTx {
    guard: OwnedMutexGuard<State>,
    staged: Vec<AttendanceRecord>,
    employee_id: u64,
    employee_name: String,
}

impl MemoryAttendanceTx {
    fn open_today(&self, date: NaiveDate) -> impl Iterator<Item = &AttendanceRecord> {
        let employee_id = self.employee_id;
        self.staged
            .iter()
            .filter(move |r| r.employee_id == employee_id && r.date == date && r.is_open())
    }
}

#[async_trait]
impl AttendanceTx for MemoryAttendanceTx {
    fn employee_name(&self) -> &str {
        &self.employee_name
    }

    async fn find_open_at(
        &mut self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.open_today(date).find(|r| r.location == location).cloned())
    }

    async fn find_open_elsewhere(
        &mut self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.open_today(date).find(|r| r.location != location).cloned())
    }

    async fn close(
        &mut self,
        record_id: u64,
        end_time: NaiveTime,
        duration: &str,
    ) -> Result<(), StoreError> {
        if let Some(record) = self
            .staged
            .iter_mut()
            .find(|r| r.id == record_id && r.is_open())
        {
            record.end_time = Some(end_time);
            record.duration = Some(duration.to_string());
        }
        Ok(())
    }

    async fn open(&mut self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        // mirrors the unique key on (employee_id, date, open_flag)
        if self.open_today(record.date).next().is_some() {
            return Err(StoreError::OpenSessionExists(record.employee_id));
        }

        let created = AttendanceRecord {
            id: self.staged.len() as u64 + 1,
            employee_id: record.employee_id,
            employee_name: record.employee_name,
            date: record.date,
            start_time: record.start_time,
            end_time: None,
            location: record.location,
            duration: None,
        };
        self.staged.push(created.clone());
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryAttendanceTx {
            mut guard, staged, ..
        } = *self;
        guard.attendance = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    fn new_user(email: &str, name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn uncommitted_work_is_discarded() {
        let store = MemoryStore::new();
        let id = store.seed_employee("Ada").await;

        let mut tx = store.lock_employee(id).await.unwrap().unwrap();
        tx.open(NewAttendance {
            employee_id: id,
            employee_name: "Ada".to_string(),
            date: day(),
            start_time: nine(),
            location: "Mitte".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        assert!(store.attendance().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_employee_has_no_unit_of_work() {
        let store = MemoryStore::new();
        assert!(store.lock_employee(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_open_row_on_same_day_is_rejected() {
        let store = MemoryStore::new();
        let id = store.seed_employee("Ada").await;
        let mut tx = store.lock_employee(id).await.unwrap().unwrap();

        let row = |location: &str| NewAttendance {
            employee_id: id,
            employee_name: "Ada".to_string(),
            date: day(),
            start_time: nine(),
            location: location.to_string(),
        };

        tx.open(row("Mitte")).await.unwrap();
        let err = tx.open(row("Spandau")).await.unwrap_err();
        assert!(matches!(err, StoreError::OpenSessionExists(e) if e == id));
    }

    #[tokio::test]
    async fn signup_reuses_employee_with_identical_name() {
        let store = MemoryStore::new();
        let seeded = store.seed_employee("Ada Lovelace").await;

        let reg = store
            .register_user(new_user("ada@example.com", "Ada Lovelace"))
            .await
            .unwrap();
        assert_eq!(reg.employee_id, seeded);

        // exact match only
        let other = store
            .register_user(new_user("ada2@example.com", "ada lovelace"))
            .await
            .unwrap();
        assert_ne!(other.employee_id, seeded);
        assert_eq!(store.employees().await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store
            .register_user(new_user("ada@example.com", "Ada"))
            .await
            .unwrap();
        let err = store
            .register_user(new_user("ada@example.com", "Someone Else"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }
}
