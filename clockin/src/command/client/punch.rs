use super::{connect, Target};
use clockin_client::session::{AttendanceSession, SessionConfig, TimerView};
use clockin_client::settings::Settings;
use clockin_client::timer::SystemClock;
use clockin_common::domain::AttendanceStatus;
use clockin_common::timestamp::format_time_of_day;
use eyre::{bail, Context, Result};
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punch {
    In,
    Out,
    Toggle,
}

impl Punch {
    /// Whether toggling from `status` is what was asked for.
    fn wants_toggle(&self, status: AttendanceStatus) -> bool {
        match self {
            Punch::In => status == AttendanceStatus::CheckedOut,
            Punch::Out => status == AttendanceStatus::CheckedIn,
            Punch::Toggle => true,
        }
    }
}

fn already(view: &TimerView) -> String {
    match view.check_in_time {
        Some(at) if view.status.is_checked_in() => {
            format!("Already checked in since {}", format_time_of_day(at))
        }
        _ => format!("Already checked out, {} worked today", view.clock),
    }
}

/// Run one check-in/check-out through a short lived session, so it goes through the same
/// optimistic update and confirmation as the live view.
pub async fn run(settings: &Settings, target: &Target, punch: Punch) -> Result<()> {
    let (api, employee_id) = connect(settings, target)?;
    let wait = settings.request_timeout() * 3;
    let session = AttendanceSession::spawn(
        api,
        SystemClock,
        employee_id,
        SessionConfig::from(settings),
    );

    let loaded = timeout(wait, session.wait_for(|x| x.loaded)).await;
    let view = match loaded {
        Ok(res) => res?,
        Err(_) => {
            session.shutdown().await;
            bail!("Could not load your attendance status");
        }
    };

    if !punch.wants_toggle(view.status) {
        println!("{}", already(&view));
        session.shutdown().await;
        return Ok(());
    }

    let settled = view.actions_settled;
    session.toggle();
    let res = timeout(
        wait,
        session.wait_for(|x| x.actions_settled > settled && !x.busy),
    )
    .await
    .wrap_err("The attendance service did not answer in time");
    session.shutdown().await;

    let view = res??;
    match view.notice {
        Some(notice) if notice.is_error() => bail!("{}", notice.text()),
        Some(notice) => println!("{}", notice.text()),
        None => {}
    }
    println!("Worked today: {}", view.clock);

    Ok(())
}
