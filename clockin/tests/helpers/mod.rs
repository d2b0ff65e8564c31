#![allow(dead_code)]

use async_trait::async_trait;
use clockin_client::api_client::AttendanceApi;
use clockin_client::error::ApiError;
use clockin_client::session::{AttendanceSession, SessionConfig, SessionHandle};
use clockin_client::settings::Settings;
use clockin_client::timer::Clock;
use clockin_common::api::{CheckInData, HistoryRecord, StatusData};
use clockin_common::domain::{AttendanceStatus, EmployeeId};
use clockin_common::timestamp::format_timestamp;
use eyre::{eyre, Result};
use fake::Fake;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::macros::datetime;
use time::OffsetDateTime;
use tokio::time::{sleep, Instant};

pub fn fake_employee_id() -> EmployeeId {
    EmployeeId::new(format!("EMP-{:04}", (1u32..9999).fake::<u32>()))
}

pub fn build_settings(server_address: &str) -> Result<(Settings, tempfile::TempDir)> {
    let temp_dir = tempfile::TempDir::new()?;
    let session_path = temp_dir.path().join("session");

    let settings: Settings = Settings::builder()?
        .set_default("session_path", session_path.to_str())?
        .set_default("log_dir", temp_dir.path().to_str())?
        .set_default("server_address", server_address)?
        .build()?
        .try_deserialize()
        .map_err(|e| eyre!("Failed to deserialize {e}"))?;

    Ok((settings, temp_dir))
}

/// Wall clock that follows tokio's (pausable) clock, starting at a fixed instant.
#[derive(Debug, Clone)]
pub struct TestClock {
    origin: OffsetDateTime,
    start: Instant,
}

impl TestClock {
    pub fn at(origin: OffsetDateTime) -> Self {
        Self {
            origin,
            start: Instant::now(),
        }
    }

    pub fn morning() -> Self {
        Self::at(datetime!(2026-10-14 09:00 UTC))
    }
}

impl Clock for TestClock {
    fn now(&self) -> OffsetDateTime {
        self.origin + (Instant::now() - self.start)
    }
}

#[derive(Debug, Clone)]
struct Today {
    status: AttendanceStatus,
    check_in: Option<OffsetDateTime>,
    /// Minutes of sessions that already ended.
    base: f64,
}

/// In-process attendance service that behaves like the real one and counts every call.
pub struct FakeApi {
    clock: TestClock,
    today: Mutex<Today>,
    history: Mutex<Vec<HistoryRecord>>,
    /// Canned status answers, used before falling back to the live state.
    scripted: Mutex<VecDeque<(Duration, StatusData)>>,
    pub fail_status: AtomicBool,
    pub fail_actions: AtomicBool,
    action_delay: Mutex<Duration>,
    pub status_calls: AtomicUsize,
    pub check_in_calls: AtomicUsize,
    pub check_out_calls: AtomicUsize,
    pub actions_finished: AtomicUsize,
}

impl FakeApi {
    pub fn new(clock: TestClock) -> Self {
        Self {
            clock,
            today: Mutex::new(Today {
                status: AttendanceStatus::CheckedOut,
                check_in: None,
                base: 0.0,
            }),
            history: Mutex::new(vec![]),
            scripted: Mutex::new(VecDeque::new()),
            fail_status: AtomicBool::new(false),
            fail_actions: AtomicBool::new(false),
            action_delay: Mutex::new(Duration::ZERO),
            status_calls: AtomicUsize::new(0),
            check_in_calls: AtomicUsize::new(0),
            check_out_calls: AtomicUsize::new(0),
            actions_finished: AtomicUsize::new(0),
        }
    }

    /// Already checked in for `minutes`, on top of `base` minutes from earlier sessions.
    pub fn checked_in(self, minutes: i64, base: f64) -> Self {
        let check_in = self.clock.now() - time::Duration::minutes(minutes);
        *self.today.lock().unwrap() = Today {
            status: AttendanceStatus::CheckedIn,
            check_in: Some(check_in),
            base,
        };
        self
    }

    pub fn with_history(self, history: Vec<HistoryRecord>) -> Self {
        *self.history.lock().unwrap() = history;
        self
    }

    pub fn with_action_delay(self, delay: Duration) -> Self {
        *self.action_delay.lock().unwrap() = delay;
        self
    }

    pub fn script_status(&self, delay: Duration, data: StatusData) {
        self.scripted.lock().unwrap().push_back((delay, data));
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn current(&self) -> StatusData {
        let today = self.today.lock().unwrap().clone();
        let now = self.clock.now();
        let live = today
            .check_in
            .filter(|_| today.status.is_checked_in())
            .map(|x| (now - x).as_seconds_f64() / 60.0)
            .unwrap_or(0.0);

        StatusData {
            status: Some(today.status),
            check_in_time: today.check_in.map(format_timestamp),
            check_out_time: None,
            total_minutes: Some(today.base + live),
        }
    }

    async fn action_gate(&self) -> Result<(), ApiError> {
        let delay = *self.action_delay.lock().unwrap();
        sleep(delay).await;
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("Attendance is locked for today".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceApi for FakeApi {
    async fn status(&self, _employee_id: &EmployeeId) -> Result<StatusData, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.scripted.lock().unwrap().pop_front();

        if let Some((delay, data)) = scripted {
            sleep(delay).await;
            return Ok(data);
        }
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable);
        }
        Ok(self.current())
    }

    async fn check_in(&self, _employee_id: &EmployeeId) -> Result<CheckInData, ApiError> {
        self.check_in_calls.fetch_add(1, Ordering::SeqCst);
        self.action_gate().await?;

        let now = self.clock.now();
        let base = {
            let mut today = self.today.lock().unwrap();
            today.status = AttendanceStatus::CheckedIn;
            today.check_in = Some(now);
            today.base
        };
        self.actions_finished.fetch_add(1, Ordering::SeqCst);

        Ok(CheckInData {
            check_in_time: Some(format_timestamp(now)),
            total_minutes: Some(base),
        })
    }

    async fn check_out(&self, _employee_id: &EmployeeId) -> Result<StatusData, ApiError> {
        self.check_out_calls.fetch_add(1, Ordering::SeqCst);
        self.action_gate().await?;

        let data = self.current();
        {
            let mut today = self.today.lock().unwrap();
            today.status = AttendanceStatus::CheckedOut;
            today.base = data.total_minutes.unwrap_or(0.0);
        }
        self.actions_finished.fetch_add(1, Ordering::SeqCst);

        Ok(data)
    }

    async fn history(
        &self,
        _employee_id: &EmployeeId,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, ApiError> {
        let history = self.history.lock().unwrap();
        Ok(history.iter().take(limit as usize).cloned().collect())
    }
}

pub struct TestSession {
    pub api: Arc<FakeApi>,
    pub clock: TestClock,
    pub user: EmployeeId,
    pub handle: SessionHandle,
}

pub fn spawn_session(api: FakeApi, clock: TestClock) -> TestSession {
    let api = Arc::new(api);
    let user = fake_employee_id();
    let handle = AttendanceSession::spawn(
        api.clone(),
        clock.clone(),
        user.clone(),
        SessionConfig::default(),
    );

    TestSession {
        api,
        clock,
        user,
        handle,
    }
}
