use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Service unavailable.")]
    Unavailable,

    #[error("There was an error with the service: Status {status}.")]
    Status {
        status: StatusCode,
        reason: Option<String>,
    },

    /// The server answered 2xx but with `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Response did not contain any data")]
    MissingData,

    #[error("Failed to reach the service: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Message that is safe to show to the employee.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unavailable => "The attendance service is unavailable. Try again later".into(),
            ApiError::Status {
                reason: Some(reason),
                ..
            } => reason.clone(),
            ApiError::Status { status, .. } => format!("The attendance service failed ({status})"),
            ApiError::Rejected(reason) => reason.clone(),
            ApiError::MissingData => "The attendance service sent an empty response".into(),
            ApiError::Transport(err) if err.is_timeout() => {
                "The attendance service did not respond in time".into()
            }
            ApiError::Transport(_) => "Could not connect to the attendance service".into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    #[error("Another check-in/check-out is already in progress")]
    Busy,

    #[error("Attendance status is still loading")]
    NotLoaded,

    /// Local state belongs to someone else, usually left over from a previous login.
    #[error("Attendance state belongs to another employee")]
    StaleState,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ActionError {
    pub fn message(&self) -> String {
        match self {
            ActionError::Busy => "Please wait for the current request to finish".into(),
            ActionError::NotLoaded => "Still loading your attendance, try again in a moment".into(),
            ActionError::StaleState => "Your attendance was refreshed, please try again".into(),
            ActionError::Api(err) => err.message(),
        }
    }
}
