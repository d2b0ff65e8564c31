use crate::api_client::AttendanceApi;
use crate::error::{ActionError, ApiError};
use crate::history::HistoryEntry;
use crate::timer::{sanitize_minutes, TimeState};
use clockin_common::api::{CheckInData, StatusData};
use clockin_common::domain::{AttendanceStatus, EmployeeId};
use clockin_common::timestamp::{date_key, parse_timestamp_or};
use time::OffsetDateTime;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckIn,
    CheckOut,
}

impl Action {
    /// The action that moves an employee out of `status`.
    pub fn toggle_of(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::CheckedIn => Action::CheckOut,
            AttendanceStatus::CheckedOut => Action::CheckIn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CheckIn => "check-in",
            Action::CheckOut => "check-out",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    CheckedIn(CheckInData),
    /// The check-out response plus the status fetched right after it, if that fetch worked.
    CheckedOut {
        response: StatusData,
        confirmed: Option<StatusData>,
    },
}

/// Run `action` against the server.
pub async fn perform<A>(
    api: &A,
    action: Action,
    employee_id: &EmployeeId,
) -> Result<ActionOutcome, ApiError>
where
    A: AttendanceApi + ?Sized,
{
    match action {
        Action::CheckIn => api.check_in(employee_id).await.map(ActionOutcome::CheckedIn),
        Action::CheckOut => {
            let response = api.check_out(employee_id).await?;
            let confirmed = match api.status(employee_id).await {
                Ok(v) => Some(v),
                Err(err) => {
                    warn!(employee = %employee_id, "failed to confirm check-out: {err}");
                    None
                }
            };
            Ok(ActionOutcome::CheckedOut {
                response,
                confirmed,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub action: Action,
    pub state: TimeState,
    pub entry: Option<HistoryEntry>,
}

#[derive(Debug)]
struct Pending {
    action: Action,
    previous: TimeState,
}

/// Check-in/check-out state machine with a single slot for the request in flight.
#[derive(Debug, Default)]
pub struct Dispatcher {
    pending: Option<Pending>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_action(&self) -> Option<Action> {
        self.pending.as_ref().map(|x| x.action)
    }

    /// Start toggling `state` for `current`, applying the optimistic update in place.
    pub fn begin(
        &mut self,
        state: &mut TimeState,
        current: &EmployeeId,
        now: OffsetDateTime,
    ) -> Result<Action, ActionError> {
        if self.pending.is_some() {
            return Err(ActionError::Busy);
        }

        if !state.belongs_to(current) {
            warn!(
                owner = %state.employee_id,
                current = %current,
                "refusing to toggle attendance owned by another employee"
            );
            return Err(ActionError::StaleState);
        }

        let action = Action::toggle_of(state.status);
        let previous = state.clone();

        match action {
            Action::CheckIn => {
                state.status = AttendanceStatus::CheckedIn;
                state.check_in_time = Some(now);
            }
            Action::CheckOut => {
                state.total_minutes = state.worked_minutes(current, now);
                state.status = AttendanceStatus::CheckedOut;
                state.check_in_time = None;
            }
        }
        state.date = date_key(now);

        debug!(%action, employee = %current, "dispatching");
        self.pending = Some(Pending { action, previous });
        Ok(action)
    }

    /// Merge a successful server answer. `None` when nothing matching was in flight.
    pub fn complete(&mut self, outcome: ActionOutcome, now: OffsetDateTime) -> Option<Completed> {
        let pending = self.pending.take()?;
        let previous = pending.previous;

        match (pending.action, outcome) {
            (Action::CheckIn, ActionOutcome::CheckedIn(data)) => {
                let check_in = parse_timestamp_or(data.check_in_time.as_deref(), now);
                // Resuming after a break keeps what was already worked today.
                let total_minutes = data
                    .total_minutes
                    .map(sanitize_minutes)
                    .unwrap_or_else(|| sanitize_minutes(previous.total_minutes));

                Some(Completed {
                    action: Action::CheckIn,
                    state: TimeState {
                        date: date_key(now),
                        status: AttendanceStatus::CheckedIn,
                        check_in_time: Some(check_in),
                        total_minutes,
                        employee_id: previous.employee_id,
                    },
                    entry: None,
                })
            }
            (
                Action::CheckOut,
                ActionOutcome::CheckedOut {
                    response,
                    confirmed,
                },
            ) => {
                let total_minutes = confirmed
                    .as_ref()
                    .and_then(|x| x.total_minutes)
                    .or(response.total_minutes)
                    .map(sanitize_minutes)
                    .unwrap_or_else(|| previous.worked_minutes(&previous.employee_id, now));
                let entry = HistoryEntry::logged(previous.check_in_time, now, total_minutes);

                Some(Completed {
                    action: Action::CheckOut,
                    state: TimeState {
                        date: date_key(now),
                        status: AttendanceStatus::CheckedOut,
                        check_in_time: None,
                        total_minutes,
                        employee_id: previous.employee_id,
                    },
                    entry: Some(entry),
                })
            }
            (action, outcome) => {
                warn!(%action, ?outcome, "outcome does not match the action in flight");
                self.pending = Some(Pending { action, previous });
                None
            }
        }
    }

    /// Give up on the action in flight and hand back the state from before it.
    pub fn fail(&mut self) -> Option<TimeState> {
        self.pending.take().map(|x| x.previous)
    }
}
