//! Check-in / check-out toggle.
//!
//! Each (employee, day, location) is either OPEN (no end time) or CLOSED.
//! A request closes the open session at that location, or opens a new one
//! when the employee has no open session anywhere that day. An open session
//! at another location rejects the request.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use strum::{AsRefStr, Display};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::duration::{calculate_duration, format_clock};
use crate::model::attendance::NewAttendance;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    CheckedIn {
        employee_name: String,
        start_time: NaiveTime,
        location: String,
    },
    CheckedOut {
        employee_name: String,
        end_time: NaiveTime,
        duration: String,
        location: String,
    },
    /// Nothing was written; the employee must check out of `open_location` first.
    Conflict {
        employee_name: String,
        open_location: String,
    },
}

/// Short name used in logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum OutcomeKind {
    Checkin,
    Checkout,
    Conflict,
}

impl ToggleOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::CheckedIn { .. } => OutcomeKind::Checkin,
            Self::CheckedOut { .. } => OutcomeKind::Checkout,
            Self::Conflict { .. } => OutcomeKind::Conflict,
        }
    }

    /// Multi-line text shown to the employee on the dashboard.
    pub fn message(&self) -> String {
        match self {
            Self::CheckedIn {
                employee_name,
                start_time,
                location,
            } => format!(
                "✅ WELCOME!\n{employee_name}\n🕐 Check-in: {}\n📍 {location}",
                format_clock(*start_time)
            ),
            Self::CheckedOut {
                employee_name,
                end_time,
                duration,
                location,
            } => format!(
                "👋 SEE YOU!\n{employee_name}\n🕐 Check-out: {}\n⏱️ Worked: {duration}\n📍 {location}",
                format_clock(*end_time)
            ),
            Self::Conflict {
                employee_name,
                open_location,
            } => format!(
                "⚠️ ATTENTION!\n{employee_name}\nYou are still checked in at {open_location}!\nPlease check out there first."
            ),
        }
    }
}

/// Width of `attendance.location`, counted in characters.
pub const MAX_LOCATION_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("location must not be empty")]
    MissingLocation,

    #[error("location is longer than {MAX_LOCATION_LEN} characters")]
    LocationTooLong,

    #[error("employee {0} not found")]
    UnknownEmployee(u64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies one toggle for `employee_id` at `location`, as of `now`.
///
/// All reads and the single write happen inside one unit of work that holds
/// the employee exclusively, so two concurrent requests for the same employee
/// cannot both decide to open a session.
#[instrument(name = "attendance_toggle", skip(store))]
pub async fn toggle(
    store: &dyn Store,
    employee_id: u64,
    location: &str,
    now: NaiveDateTime,
) -> Result<ToggleOutcome, ToggleError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ToggleError::MissingLocation);
    }
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(ToggleError::LocationTooLong);
    }

    let mut tx = store
        .lock_employee(employee_id)
        .await?
        .ok_or(ToggleError::UnknownEmployee(employee_id))?;

    let employee_name = tx.employee_name().to_string();
    let today = now.date();
    let clock = truncate_to_minute(now.time());

    if let Some(open) = tx.find_open_at(today, location).await? {
        debug_assert!(open.is_open());
        let duration = calculate_duration(&format_clock(open.start_time), &format_clock(clock));
        tx.close(open.id, clock, &duration).await?;
        tx.commit().await?;

        info!(record_id = open.id, %duration, "Checked out");
        return Ok(ToggleOutcome::CheckedOut {
            employee_name,
            end_time: clock,
            duration,
            location: location.to_string(),
        });
    }

    if let Some(elsewhere) = tx.find_open_elsewhere(today, location).await? {
        debug!(open_location = %elsewhere.location, "Open session at another location");
        return Ok(ToggleOutcome::Conflict {
            employee_name,
            open_location: elsewhere.location,
        });
    }

    let inserted = tx
        .open(NewAttendance {
            employee_id,
            employee_name: employee_name.clone(),
            date: today,
            start_time: clock,
            location: location.to_string(),
        })
        .await;

    let opened = match inserted {
        Ok(opened) => opened,
        // the unique key caught a session opened outside the row lock
        Err(StoreError::OpenSessionExists(_)) => {
            let open_location = tx
                .find_open_elsewhere(today, "")
                .await?
                .map(|r| r.location)
                .unwrap_or_else(|| location.to_string());
            warn!(%open_location, "Open-session key rejected insert");
            return Ok(ToggleOutcome::Conflict {
                employee_name,
                open_location,
            });
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;

    info!(record_id = opened.id, "Checked in");
    Ok(ToggleOutcome::CheckedIn {
        employee_name,
        start_time: clock,
        location: opened.location,
    })
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
