use super::{connect, Target};
use clap::Parser;
use clockin_client::api_client::AttendanceApi;
use clockin_client::history::HistoryEntry;
use clockin_client::settings::Settings;
use clockin_common::timestamp::format_time_of_day;
use eyre::{eyre, Result};

#[derive(Parser, Debug)]
pub struct Cmd {
    /// Number of records to fetch, defaults to `history_limit` from the config
    #[arg(long, short)]
    limit: Option<u32>,
}

impl Cmd {
    pub(crate) async fn run(self, settings: &Settings, target: &Target) -> Result<()> {
        let (api, employee_id) = connect(settings, target)?;
        let limit = self.limit.unwrap_or(settings.history_limit);
        let records = api
            .history(&employee_id, limit)
            .await
            .map_err(|err| eyre!("{}", err.message()))?;

        if records.is_empty() {
            println!("No check-ins yet");
            return Ok(());
        }

        for entry in records.iter().map(HistoryEntry::from) {
            println!(
                "{:<12} {:>5} - {:<5}  {}",
                entry.date,
                entry.check_in_time.map(format_time_of_day).unwrap_or("--:--".into()),
                entry.check_out_time.map(format_time_of_day).unwrap_or("--:--".into()),
                entry.label
            );
        }

        Ok(())
    }
}
