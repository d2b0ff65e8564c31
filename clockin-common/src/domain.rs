use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttendanceStatus {
    CheckedIn,
    #[default]
    CheckedOut,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::CheckedIn => "checked-in",
            AttendanceStatus::CheckedOut => "checked-out",
        }
    }

    pub fn is_checked_in(&self) -> bool {
        matches!(self, AttendanceStatus::CheckedIn)
    }
}

/// The backend only ever reports "checked-in" for a running session. Anything else,
/// including statuses we don't know about, means there is no running session.
impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checked-in" => Ok(Self::CheckedIn),
            _ => Ok(Self::CheckedOut),
        }
    }
}

impl From<String> for AttendanceStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(v) => v,
            Err(_) => Self::CheckedOut,
        }
    }
}

impl From<AttendanceStatus> for String {
    fn from(value: AttendanceStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier of an employee as the HR backend knows it (e.g. "EMP-0042").
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl FromStr for EmployeeId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Employee id can not be empty");
        }
        if s.chars().any(char::is_whitespace) {
            return Err("Employee id can not contain whitespace");
        }

        Ok(Self(s.into()))
    }
}

impl AsRef<str> for EmployeeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
