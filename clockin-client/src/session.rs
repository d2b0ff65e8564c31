//! A live attendance session: the state behind a running timer view.
//!
//! The session owns the [`TimeState`] and is the only place that mutates it. It runs as one task
//! that reacts to three kinds of input:
//! - commands from the view (toggle, refresh, shutdown),
//! - its own clocks (a fast tick that republishes the timer, a slow poll that re-fetches status),
//! - results of the requests it spawned.
//!
//! Requests are spawned into a [`JoinSet`] owned by the session, so tearing the session down
//! aborts whatever is still in flight and nothing lands on a disposed view.

use crate::api_client::AttendanceApi;
use crate::dispatch::{perform, Action, ActionOutcome, Dispatcher};
use crate::error::{ActionError, ApiError};
use crate::format::format_clock;
use crate::history::HistoryEntry;
use crate::settings::Settings;
use crate::sync::{reconcile, RequestToken, StatusSnapshot, SyncGate};
use crate::timer::{Clock, TimeState};
use clockin_common::api::{HistoryRecord, StatusData};
use clockin_common::domain::{AttendanceStatus, EmployeeId};
use clockin_common::timestamp::format_time_of_day;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tick_interval: Duration,
    pub poll_interval: Duration,
    pub confirm_delay: Duration,
    pub history_limit: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            poll_interval: Duration::from_secs(30),
            confirm_delay: Duration::from_secs(1),
            history_limit: 10,
        }
    }
}

impl From<&Settings> for SessionConfig {
    fn from(value: &Settings) -> Self {
        Self {
            tick_interval: Duration::from_millis(value.tick_interval_ms.max(50)),
            poll_interval: Duration::from_secs(value.poll_interval_secs.max(1)),
            confirm_delay: Duration::from_millis(value.confirm_delay_ms),
            history_limit: value.history_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(v) | Notice::Error(v) => v.as_str(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Everything a view needs to draw the timer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerView {
    pub employee_id: EmployeeId,
    pub status: AttendanceStatus,
    pub check_in_time: Option<OffsetDateTime>,
    pub worked_minutes: f64,
    pub clock: String,
    /// A check-in/check-out is in flight.
    pub busy: bool,
    /// At least one status fetch succeeded.
    pub loaded: bool,
    pub last_sync: Option<OffsetDateTime>,
    pub notice: Option<Notice>,
    pub history: Vec<HistoryEntry>,
    /// Number of check-in/check-out attempts that finished, successfully or not.
    pub actions_settled: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Toggle,
    Refresh,
    Shutdown,
}

#[derive(Debug)]
enum Event {
    Status {
        token: RequestToken,
        result: Result<StatusData, ApiError>,
    },
    History(Result<Vec<HistoryRecord>, ApiError>),
    Action(Result<ActionOutcome, ApiError>),
    ConfirmDue,
}

enum Step {
    Command(Option<Command>),
    Event(Event),
    Tick,
    Poll,
    Reaped,
}

/// Handle to a running session. Dropping it shuts the session down.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<TimerView>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn toggle(&self) {
        let _ = self.commands.send(Command::Toggle);
    }

    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    pub fn view(&self) -> TimerView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerView> {
        self.view.clone()
    }

    /// Wait until the view satisfies `f`. Fails if the session stopped first.
    pub async fn wait_for(&self, f: impl FnMut(&TimerView) -> bool) -> eyre::Result<TimerView> {
        let mut view = self.view.clone();
        let res = view.wait_for(f).await?.clone();
        Ok(res)
    }

    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(err) = self.task.await {
            if !err.is_cancelled() {
                error!("attendance session ended abnormally: {err}");
            }
        }
    }
}

pub struct AttendanceSession<A, C> {
    api: Arc<A>,
    clock: C,
    user: EmployeeId,
    config: SessionConfig,
    state: TimeState,
    gate: SyncGate,
    dispatcher: Dispatcher,
    loaded: bool,
    last_sync: Option<OffsetDateTime>,
    notice: Option<Notice>,
    history: Vec<HistoryEntry>,
    actions_settled: u64,
    tasks: JoinSet<()>,
    events: mpsc::UnboundedSender<Event>,
    view: watch::Sender<TimerView>,
}

impl<A, C> AttendanceSession<A, C>
where
    A: AttendanceApi + 'static,
    C: Clock,
{
    /// Start a session for `user` on the current tokio runtime.
    pub fn spawn(api: Arc<A>, clock: C, user: EmployeeId, config: SessionConfig) -> SessionHandle {
        let state = TimeState::new(user.clone(), clock.now());
        let (events, events_rx) = mpsc::unbounded_channel();
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(TimerView::empty());

        let session = Self {
            api,
            clock,
            user,
            config,
            state,
            gate: SyncGate::new(),
            dispatcher: Dispatcher::new(),
            loaded: false,
            last_sync: None,
            notice: None,
            history: vec![],
            actions_settled: 0,
            tasks: JoinSet::new(),
            events,
            view,
        };
        session.publish();

        let task = tokio::spawn(session.run(commands_rx, events_rx));

        SessionHandle {
            commands,
            view: view_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        info!(employee = %self.user, "attendance session started");
        self.request_status();
        self.request_history();

        let mut tick = interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut poll = interval_at(
            Instant::now() + self.config.poll_interval,
            self.config.poll_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                cmd = commands.recv() => Step::Command(cmd),
                Some(ev) = events.recv() => Step::Event(ev),
                _ = tick.tick() => Step::Tick,
                _ = poll.tick() => Step::Poll,
                Some(_) = self.tasks.join_next(), if !self.tasks.is_empty() => Step::Reaped,
            };

            match step {
                Step::Command(Some(Command::Toggle)) => self.toggle(),
                Step::Command(Some(Command::Refresh)) => self.request_status(),
                Step::Command(Some(Command::Shutdown)) | Step::Command(None) => break,
                Step::Event(ev) => self.handle_event(ev),
                Step::Poll => self.request_status(),
                Step::Tick | Step::Reaped => {}
            }

            self.publish();
        }

        self.tasks.abort_all();
        info!(employee = %self.user, "attendance session stopped");
    }

    fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    fn request_status(&mut self) {
        let token = self.gate.issue();
        let api = self.api.clone();
        let user = self.user.clone();
        let events = self.events.clone();
        debug!(token = token.inner(), "requesting status");

        self.tasks.spawn(async move {
            let result = api.status(&user).await;
            let _ = events.send(Event::Status { token, result });
        });
    }

    fn request_history(&mut self) {
        let api = self.api.clone();
        let user = self.user.clone();
        let events = self.events.clone();
        let limit = self.config.history_limit;

        self.tasks.spawn(async move {
            let result = api.history(&user, limit).await;
            let _ = events.send(Event::History(result));
        });
    }

    fn schedule_confirm(&mut self) {
        let events = self.events.clone();
        let delay = self.config.confirm_delay;

        self.tasks.spawn(async move {
            sleep(delay).await;
            let _ = events.send(Event::ConfirmDue);
        });
    }

    fn toggle(&mut self) {
        let now = self.now();

        if !self.loaded {
            self.notice = Some(Notice::Info(ActionError::NotLoaded.message()));
            self.request_status();
            return;
        }

        match self.dispatcher.begin(&mut self.state, &self.user, now) {
            Ok(action) => {
                self.notice = None;
                let api = self.api.clone();
                let user = self.user.clone();
                let events = self.events.clone();

                self.tasks.spawn(async move {
                    let result = perform(api.as_ref(), action, &user).await;
                    let _ = events.send(Event::Action(result));
                });
            }
            Err(ActionError::Busy) => {
                debug!("toggle ignored, an action is already in flight");
            }
            Err(err) => {
                self.notice = Some(Notice::Error(err.message()));
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        let now = self.now();

        match event {
            Event::Status { token, result } => self.apply_status(token, result, now),
            Event::History(Ok(records)) => {
                let fetched = records.iter().map(HistoryEntry::from).collect::<Vec<_>>();
                // Entries recorded locally since the session started stay on top.
                let mut history = self
                    .history
                    .drain(..)
                    .filter(|x| {
                        !fetched
                            .iter()
                            .any(|y| y.date == x.date && y.check_out_time == x.check_out_time)
                    })
                    .collect::<Vec<_>>();
                history.extend(fetched);
                self.history = history;
            }
            Event::History(Err(err)) => {
                error!("failed to fetch check-in history: {err}");
            }
            Event::Action(Ok(outcome)) => {
                let Some(completed) = self.dispatcher.complete(outcome, now) else {
                    return;
                };
                self.state = completed.state;
                self.gate.supersede();
                self.actions_settled += 1;

                match completed.action {
                    Action::CheckIn => {
                        let at = self
                            .state
                            .check_in_time
                            .map(format_time_of_day)
                            .unwrap_or_default();
                        info!(employee = %self.user, "checked in at {at}");
                        self.notice = Some(Notice::Info(format!("Checked in at {at}")));
                        self.schedule_confirm();
                    }
                    Action::CheckOut => {
                        if let Some(entry) = completed.entry {
                            info!(employee = %self.user, "checked out, {}", entry.label);
                            self.notice = Some(Notice::Info(format!("Checked out, {}", entry.label)));
                            self.history.insert(0, entry);
                        }
                    }
                }
            }
            Event::Action(Err(err)) => {
                let action = self.dispatcher.pending_action();
                if let Some(previous) = self.dispatcher.fail() {
                    self.state = previous;
                }
                self.actions_settled += 1;
                error!(?action, "attendance action failed: {err}");
                self.notice = Some(Notice::Error(ActionError::from(err).message()));
            }
            Event::ConfirmDue => self.request_status(),
        }
    }

    fn apply_status(
        &mut self,
        token: RequestToken,
        result: Result<StatusData, ApiError>,
        now: OffsetDateTime,
    ) {
        let data = match result {
            Ok(v) => v,
            Err(err) => {
                // Keep showing what we have, the next poll gets another chance.
                error!(token = token.inner(), "failed to fetch check-in status: {err}");
                return;
            }
        };

        if self.dispatcher.is_busy() {
            debug!(token = token.inner(), "discarding status while an action is in flight");
            return;
        }

        if !self.gate.admit(token) {
            debug!(token = token.inner(), "discarding overtaken status response");
            return;
        }

        let snapshot = StatusSnapshot::from_wire(self.user.clone(), &data);
        self.state = reconcile(&self.state, &snapshot, now);
        self.loaded = true;
        self.last_sync = Some(now);
    }

    fn build_view(&self, now: OffsetDateTime) -> TimerView {
        let worked_minutes = self.state.worked_minutes(&self.user, now);
        TimerView {
            employee_id: self.user.clone(),
            status: self.state.status,
            check_in_time: self.state.check_in_time,
            worked_minutes,
            clock: format_clock(worked_minutes),
            busy: self.dispatcher.is_busy(),
            loaded: self.loaded,
            last_sync: self.last_sync,
            notice: self.notice.clone(),
            history: self.history.clone(),
            actions_settled: self.actions_settled,
        }
    }

    fn publish(&self) {
        let view = self.build_view(self.now());
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}

impl TimerView {
    fn empty() -> Self {
        Self {
            employee_id: EmployeeId::new(""),
            status: AttendanceStatus::CheckedOut,
            check_in_time: None,
            worked_minutes: 0.0,
            clock: format_clock(0.0),
            busy: false,
            loaded: false,
            last_sync: None,
            notice: None,
            history: vec![],
            actions_settled: 0,
        }
    }
}
