use crate::domain::{AttendanceStatus, EmployeeId};

/// Every endpoint wraps its payload in the same `{success, data, error}` envelope.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// The server's explanation of a failure, if it gave one.
    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Body of both `POST /checkin` and `POST /checkout`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    pub employee_id: EmployeeId,
}

/// Status of the current day.
///
/// NOTE: `total_minutes` includes the running session when `status` is checked-in.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub total_minutes: Option<f64>,
}

impl StatusData {
    pub fn status(&self) -> AttendanceStatus {
        self.status.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInData {
    pub check_in_time: Option<String>,
    /// Minutes already worked today before this check-in.
    pub total_minutes: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryData {
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub date: String,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    #[serde(default)]
    pub total_hours: f64,
    pub total_minutes: Option<f64>,
}

impl HistoryRecord {
    pub fn minutes(&self) -> f64 {
        self.total_minutes
            .unwrap_or(self.total_hours * 60.0)
            .max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_envelope_tolerates_missing_fields() {
        let raw = r#"{"success":true,"data":{"status":"checked-in","checkInTime":"2026-10-14T09:00:00.000Z","totalMinutes":42.5}}"#;
        let res: ApiResponse<StatusData> = serde_json::from_str(raw).unwrap();
        let data = res.data.unwrap();

        assert_eq!(data.status(), AttendanceStatus::CheckedIn);
        assert_eq!(data.total_minutes, Some(42.5));
        assert_eq!(data.check_out_time, None);

        let raw = r#"{"success":false,"error":"Employee ID is required"}"#;
        let res: ApiResponse<StatusData> = serde_json::from_str(raw).unwrap();
        assert!(!res.success);
        assert_eq!(res.reason(), Some("Employee ID is required"));
    }

    #[test]
    fn history_minutes_prefer_total_minutes() {
        let raw = r#"{"history":[{"date":"2026-10-13","totalHours":7.5},{"date":"2026-10-12","totalHours":1,"totalMinutes":90}]}"#;
        let res: HistoryData = serde_json::from_str(raw).unwrap();

        assert_eq!(res.history[0].minutes(), 450.0);
        assert_eq!(res.history[1].minutes(), 90.0);
    }

    #[test]
    fn request_body_is_camel_case() {
        let body = EmployeeRequest {
            employee_id: EmployeeId::new("EMP-7"),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"employeeId":"EMP-7"}"#
        );
    }
}
