use crate::error::ApiError;
use async_trait::async_trait;
use clockin_common::api::{
    ApiResponse, CheckInData, EmployeeRequest, ErrorMessage, HistoryData, HistoryRecord,
    StatusData,
};
use clockin_common::domain::EmployeeId;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// The attendance endpoints the timer depends on.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Status of today. The returned minutes include the running session.
    async fn status(&self, employee_id: &EmployeeId) -> Result<StatusData, ApiError>;

    async fn check_in(&self, employee_id: &EmployeeId) -> Result<CheckInData, ApiError>;

    async fn check_out(&self, employee_id: &EmployeeId) -> Result<StatusData, ApiError>;

    async fn history(
        &self,
        employee_id: &EmployeeId,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, ApiError>;
}

async fn handle_response_error(res: Response) -> Result<Response, ApiError> {
    let status = res.status();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(ApiError::Unavailable);
    }

    if !status.is_success() {
        let reason = res
            .json::<ErrorMessage>()
            .await
            .ok()
            .and_then(|x| x.error.or(x.message));
        return Err(ApiError::Status { status, reason });
    }

    Ok(res)
}

async fn read_envelope<T: DeserializeOwned>(res: Response) -> Result<Option<T>, ApiError> {
    let res = handle_response_error(res).await?;
    let res = res.json::<ApiResponse<T>>().await?;

    if !res.success {
        let reason = res.reason().unwrap_or("Request was not successful").to_string();
        return Err(ApiError::Rejected(reason));
    }

    Ok(res.data)
}

pub struct AttendanceClient {
    client: reqwest::Client,
    address: String,
    company: Option<String>,
}

impl AttendanceClient {
    pub fn new(
        address: &str,
        token: Option<&str>,
        company: Option<&str>,
        timeout: Duration,
    ) -> eyre::Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.map(str::trim).filter(|x| !x.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
            company: company
                .map(str::trim)
                .filter(|x| !x.is_empty())
                .map(String::from),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    fn query(&self, employee_id: Option<&EmployeeId>) -> Vec<(&'static str, String)> {
        let mut query = vec![];
        if let Some(id) = employee_id {
            query.push(("employeeId", id.to_string()));
        }
        if let Some(company) = &self.company {
            query.push(("company", company.clone()));
        }
        query
    }

    /// The home dashboard payload (announcements, leave balance, ...). Passed through untouched.
    pub async fn dashboard(&self, employee_id: &EmployeeId) -> Result<serde_json::Value, ApiError> {
        let url = self.url("/dashboard");
        debug!("fetching dashboard from {url}");
        let res = self
            .client
            .get(&url)
            .query(&self.query(Some(employee_id)))
            .send()
            .await?;

        read_envelope::<serde_json::Value>(res)
            .await?
            .ok_or(ApiError::MissingData)
    }
}

#[async_trait]
impl AttendanceApi for AttendanceClient {
    async fn status(&self, employee_id: &EmployeeId) -> Result<StatusData, ApiError> {
        let url = self.url("/checkin/status");
        debug!("fetching check-in status from {url}");
        let res = self
            .client
            .get(&url)
            .query(&self.query(Some(employee_id)))
            .send()
            .await?;

        read_envelope::<StatusData>(res)
            .await?
            .ok_or(ApiError::MissingData)
    }

    async fn check_in(&self, employee_id: &EmployeeId) -> Result<CheckInData, ApiError> {
        let url = self.url("/checkin");
        debug!("posting check-in to {url}");
        let res = self
            .client
            .post(&url)
            .query(&self.query(None))
            .json(&EmployeeRequest {
                employee_id: employee_id.clone(),
            })
            .send()
            .await?;

        Ok(read_envelope::<CheckInData>(res).await?.unwrap_or_default())
    }

    async fn check_out(&self, employee_id: &EmployeeId) -> Result<StatusData, ApiError> {
        let url = self.url("/checkout");
        debug!("posting check-out to {url}");
        let res = self
            .client
            .post(&url)
            .query(&self.query(None))
            .json(&EmployeeRequest {
                employee_id: employee_id.clone(),
            })
            .send()
            .await?;

        Ok(read_envelope::<StatusData>(res).await?.unwrap_or_default())
    }

    async fn history(
        &self,
        employee_id: &EmployeeId,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, ApiError> {
        let url = self.url("/checkin/history");
        debug!("fetching check-in history from {url}");
        let mut query = self.query(Some(employee_id));
        query.push(("limit", limit.to_string()));
        let res = self.client.get(&url).query(&query).send().await?;

        Ok(read_envelope::<HistoryData>(res)
            .await?
            .map(|x| x.history)
            .unwrap_or_default())
    }
}
