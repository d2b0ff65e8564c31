use clockin_common::domain::{AttendanceStatus, EmployeeId};
use clockin_common::timestamp::date_key;
use time::OffsetDateTime;
use tracing::warn;

/// Source of wall clock time for the timer.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Minutes between two instants, negative when `since` is in the future.
pub fn elapsed_minutes(since: OffsetDateTime, now: OffsetDateTime) -> f64 {
    (now - since).as_seconds_f64() / 60.0
}

/// Client side view of today's attendance.
///
/// `total_minutes` holds the *base* minutes: time worked in sessions that already ended today.
/// The running session is never folded into it, it is always derived from `check_in_time` when
/// the timer is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeState {
    pub date: String,
    pub status: AttendanceStatus,
    pub check_in_time: Option<OffsetDateTime>,
    pub total_minutes: f64,
    pub employee_id: EmployeeId,
}

impl TimeState {
    pub fn new(employee_id: EmployeeId, now: OffsetDateTime) -> Self {
        Self {
            date: date_key(now),
            status: AttendanceStatus::CheckedOut,
            check_in_time: None,
            total_minutes: 0.0,
            employee_id,
        }
    }

    pub fn belongs_to(&self, employee_id: &EmployeeId) -> bool {
        &self.employee_id == employee_id
    }

    /// Minutes of the running session, zero when checked out or when the check-in lies ahead.
    fn live_minutes(&self, now: OffsetDateTime) -> f64 {
        match (self.status, self.check_in_time) {
            (AttendanceStatus::CheckedIn, Some(check_in)) => elapsed_minutes(check_in, now).max(0.0),
            _ => 0.0,
        }
    }

    /// Total minutes worked today as shown to `current`.
    pub fn worked_minutes(&self, current: &EmployeeId, now: OffsetDateTime) -> f64 {
        if !self.belongs_to(current) {
            return 0.0;
        }

        let base = sanitize_minutes(self.total_minutes);

        if self.status.is_checked_in() && self.check_in_time.is_none() {
            warn!(employee = %self.employee_id, "checked in without a check-in time");
        }

        base + self.live_minutes(now)
    }
}

/// Clamp a minute count coming from anywhere to a finite, non-negative value.
pub fn sanitize_minutes(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
