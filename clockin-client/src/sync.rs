use crate::timer::{elapsed_minutes, sanitize_minutes, TimeState};
use clockin_common::api::StatusData;
use clockin_common::domain::{AttendanceStatus, EmployeeId};
use clockin_common::timestamp::{date_key, parse_timestamp};
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Status as the server reports it. Unlike [`TimeState`] the minutes include the running session.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub employee_id: EmployeeId,
    pub status: AttendanceStatus,
    pub check_in_time: Option<OffsetDateTime>,
    pub total_minutes: f64,
}

impl StatusSnapshot {
    pub fn from_wire(employee_id: EmployeeId, data: &StatusData) -> Self {
        let check_in_time = match data.check_in_time.as_deref().map(parse_timestamp) {
            Some(Ok(v)) => Some(v),
            Some(Err(err)) => {
                warn!(employee = %employee_id, "malformed check-in time in status: {err}");
                None
            }
            None => None,
        };

        Self {
            employee_id,
            status: data.status(),
            check_in_time,
            total_minutes: sanitize_minutes(data.total_minutes.unwrap_or(0.0)),
        }
    }
}

/// Back the running session out of a server total so that only the base minutes remain.
pub fn base_minutes(server_total: f64, check_in: OffsetDateTime, now: OffsetDateTime) -> f64 {
    (sanitize_minutes(server_total) - elapsed_minutes(check_in, now)).max(0.0)
}

/// Merge a server snapshot into local state.
///
/// When the server lost or mangled the check-in time of a running session, the last good local
/// one is kept, and failing that the session is assumed to start now.
pub fn reconcile(local: &TimeState, snapshot: &StatusSnapshot, now: OffsetDateTime) -> TimeState {
    match snapshot.status {
        AttendanceStatus::CheckedIn => {
            let local_check_in = local
                .belongs_to(&snapshot.employee_id)
                .then_some(local.check_in_time)
                .flatten()
                .filter(|_| local.status.is_checked_in());
            let check_in = snapshot.check_in_time.or(local_check_in).unwrap_or(now);
            let total_minutes = base_minutes(snapshot.total_minutes, check_in, now);

            debug!(
                server_total = snapshot.total_minutes,
                base = total_minutes,
                "reconciled running session"
            );

            TimeState {
                date: date_key(now),
                status: AttendanceStatus::CheckedIn,
                check_in_time: Some(check_in),
                total_minutes,
                employee_id: snapshot.employee_id.clone(),
            }
        }
        AttendanceStatus::CheckedOut => TimeState {
            date: date_key(now),
            status: AttendanceStatus::CheckedOut,
            check_in_time: None,
            total_minutes: snapshot.total_minutes,
            employee_id: snapshot.employee_id.clone(),
        },
    }
}

/// Tag handed out with every status fetch. Later fetches get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn inner(&self) -> u64 {
        self.0
    }
}

/// Decides which status responses are still worth applying.
///
/// Responses can overtake each other, so a response is only applied when it was requested after
/// the last one that was applied.
#[derive(Debug, Default)]
pub struct SyncGate {
    issued: u64,
    applied: u64,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Returns true when the response for `token` should be applied, and records it as applied.
    pub fn admit(&mut self, token: RequestToken) -> bool {
        if token.0 <= self.applied {
            return false;
        }
        self.applied = token.0;
        true
    }

    /// Invalidate every request issued so far. Used when local state changed underneath them.
    pub fn supersede(&mut self) {
        self.applied = self.issued;
    }
}
