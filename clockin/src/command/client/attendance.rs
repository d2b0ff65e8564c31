use super::{connect, Target};
use clap::Parser;
use clockin_client::api_client::AttendanceApi;
use clockin_client::attendance::{
    build_report, history_limit, history_reaches, parse_month, Timeframe,
};
use clockin_client::settings::Settings;
use clockin_client::timer::{Clock, SystemClock};
use clockin_common::timestamp::format_time_of_day;
use eyre::{eyre, Result};
use tracing::warn;

#[derive(Parser, Debug)]
pub struct Cmd {
    /// One of 7d, month, prev
    #[arg(long, short, default_value = "7d")]
    timeframe: String,

    /// A specific month as YYYY-MM
    #[arg(long, short, conflicts_with = "timeframe")]
    month: Option<String>,
}

impl Cmd {
    pub(crate) async fn run(self, settings: &Settings, target: &Target) -> Result<()> {
        let timeframe = match &self.month {
            Some(month) => parse_month(month)?,
            None => self.timeframe.parse::<Timeframe>()?,
        };

        let today = SystemClock.now().date();
        let range = timeframe.range(today)?;
        let (api, employee_id) = connect(settings, target)?;

        let limit = history_limit(range.0, today);
        let history = api
            .history(&employee_id, limit)
            .await
            .map_err(|err| eyre!("{}", err.message()))?;
        if !history_reaches(&history, limit, range.0) {
            warn!(limit, start = %range.0, "history does not reach the start of the range");
            eprintln!("Warning: history ends before {}, earlier days may show as absent", range.0);
        }
        // The report still makes sense from history alone.
        let status = match api.status(&employee_id).await {
            Ok(v) => Some(v),
            Err(err) => {
                warn!("failed to fetch today's status: {err}");
                None
            }
        };

        let report = build_report(&history, status.as_ref(), range, today);

        println!("Attendance for {employee_id}, {timeframe} ({} to {})", report.start, report.end);
        println!();
        for day in &report.days {
            println!(
                "{} {:<3}  {:<8} {:>5} - {:<5} {:>6.2} h",
                day.date,
                &day.date.weekday().to_string()[..3],
                day.status.as_str(),
                day.check_in_time.map(format_time_of_day).unwrap_or_default(),
                day.check_out_time.map(format_time_of_day).unwrap_or_default(),
                day.hours
            );
        }
        println!();
        println!(
            "Present: {}  Absent: {}  Total: {:.1} h",
            report.present_days, report.absent_days, report.total_hours
        );

        Ok(())
    }
}
