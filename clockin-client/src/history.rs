use crate::format::{format_hours_logged, round_to};
use clockin_common::api::HistoryRecord;
use clockin_common::timestamp::{date_key, parse_optional};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub date: String,
    pub check_in_time: Option<OffsetDateTime>,
    pub check_out_time: Option<OffsetDateTime>,
    pub total_hours: f64,
    pub label: String,
}

impl HistoryEntry {
    /// Entry recorded locally right after a successful check-out.
    pub fn logged(
        check_in_time: Option<OffsetDateTime>,
        check_out_time: OffsetDateTime,
        total_minutes: f64,
    ) -> Self {
        Self {
            date: date_key(check_out_time),
            check_in_time,
            check_out_time: Some(check_out_time),
            total_hours: round_to(total_minutes / 60.0, 2),
            label: format_hours_logged(total_minutes),
        }
    }
}

impl From<&HistoryRecord> for HistoryEntry {
    fn from(value: &HistoryRecord) -> Self {
        let minutes = value.minutes();
        Self {
            date: value.date.clone(),
            check_in_time: parse_optional(value.check_in_time.as_deref()),
            check_out_time: parse_optional(value.check_out_time.as_deref()),
            total_hours: round_to(minutes / 60.0, 2),
            label: format_hours_logged(minutes),
        }
    }
}
