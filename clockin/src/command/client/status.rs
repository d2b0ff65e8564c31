use super::{connect, Target};
use clockin_client::api_client::AttendanceApi;
use clockin_client::format::format_clock;
use clockin_client::settings::Settings;
use clockin_client::sync::{reconcile, StatusSnapshot};
use clockin_client::timer::{Clock, SystemClock, TimeState};
use clockin_common::timestamp::format_time_of_day;
use eyre::{eyre, Result};
use time::{Duration, OffsetDateTime};

pub(crate) fn naive_time_ago(timestamp: OffsetDateTime, now: OffsetDateTime) -> String {
    let duration = now - timestamp;

    if duration < Duration::minutes(1) {
        "just now".to_string()
    } else if duration < Duration::hours(1) {
        format!("{} minutes ago", duration.whole_minutes())
    } else if duration < Duration::days(1) {
        format!("{} hours ago", duration.whole_hours())
    } else {
        format!("{} days ago", duration.whole_days())
    }
}

pub async fn run(settings: &Settings, target: &Target) -> Result<()> {
    let (api, employee_id) = connect(settings, target)?;
    let data = api
        .status(&employee_id)
        .await
        .map_err(|err| eyre!("{}", err.message()))?;

    let now = SystemClock.now();
    let snapshot = StatusSnapshot::from_wire(employee_id.clone(), &data);
    let state = reconcile(&TimeState::new(employee_id.clone(), now), &snapshot, now);
    let worked = state.worked_minutes(&employee_id, now);

    println!("Employee: {employee_id}");
    match state.check_in_time {
        Some(check_in) if state.status.is_checked_in() => println!(
            "Status:   {} since {} ({})",
            state.status,
            format_time_of_day(check_in),
            naive_time_ago(check_in, now)
        ),
        _ => println!("Status:   {}", state.status),
    }
    println!("Worked:   {}", format_clock(worked));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn time_ago() {
        let now = datetime!(2026-10-14 12:00 UTC);
        assert_eq!(naive_time_ago(now - Duration::seconds(20), now), "just now");
        assert_eq!(naive_time_ago(now - Duration::minutes(35), now), "35 minutes ago");
        assert_eq!(naive_time_ago(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(naive_time_ago(now - Duration::days(2), now), "2 days ago");
    }
}
