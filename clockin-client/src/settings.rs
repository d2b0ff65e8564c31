use crate::api_client::AttendanceClient;
use clockin_common::domain::EmployeeId;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File as ConfigFile, FileFormat};
use eyre::{eyre, Context, Result};
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const EXAMPLE_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub server_address: String,
    pub employee_id: Option<String>,
    pub company: Option<String>,
    pub session_path: String,
    pub log_dir: String,
    pub poll_interval_secs: u64,
    pub tick_interval_ms: u64,
    pub confirm_delay_ms: u64,
    pub history_limit: u32,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn config_file() -> PathBuf {
        let mut config_file = if let Ok(p) = std::env::var("CLOCKIN_CONFIG_DIR") {
            PathBuf::from(p)
        } else {
            clockin_common::utils::config_dir()
        };
        config_file.push("config.toml");
        config_file
    }

    /// Bearer token of the current login, if there is one.
    pub fn session(&self) -> Option<String> {
        let path = PathBuf::from(&self.session_path);

        if !path.exists() {
            return None;
        }

        fs_err::read_to_string(path)
            .ok()
            .map(|x| x.trim().to_string())
            .filter(|x| !x.is_empty())
    }

    /// The employee to act for. A command line value wins over the config.
    pub fn employee_id(&self, value: Option<&str>) -> Result<EmployeeId> {
        let value = value
            .or(self.employee_id.as_deref())
            .ok_or_else(|| eyre!("No employee id. Pass --employee or set employee_id in the config"))?;

        EmployeeId::from_str(value).map_err(|err| eyre!("Invalid employee id {value:?}: {err}"))
    }

    pub fn company<'a>(&'a self, value: Option<&'a str>) -> Option<&'a str> {
        value.or(self.company.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn api_client(&self, company: Option<&str>) -> Result<AttendanceClient> {
        let token = self.session();
        AttendanceClient::new(
            &self.server_address,
            token.as_deref(),
            self.company(company),
            self.request_timeout(),
        )
        .wrap_err("Failed to build the attendance client")
    }

    pub fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let data_dir = clockin_common::utils::data_dir();
        let session_path = data_dir.join("session");

        Ok(Config::builder()
            .set_default("server_address", "http://127.0.0.1:3000/api/employee-portal")?
            .set_default("session_path", session_path.to_str())?
            .set_default("log_dir", data_dir.to_str())?
            .set_default("poll_interval_secs", 30)?
            .set_default("tick_interval_ms", 1000)?
            .set_default("confirm_delay_ms", 1000)?
            .set_default("history_limit", 10)?
            .set_default("request_timeout_secs", 10)?)
    }

    /// Defaults, then `config_file` when it exists, then `CLOCKIN_*` env vars.
    pub fn load(config_file: &Path) -> Result<Self> {
        let mut config_builder = Self::builder()?;
        if config_file.exists() {
            config_builder =
                config_builder.add_source(ConfigFile::from(config_file).format(FileFormat::Toml));
        }

        let settings: Settings = config_builder
            .add_source(
                Environment::with_prefix("clockin")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| eyre!("Failed to deserialize {}", e))?;

        settings.expanded()
    }

    pub fn new() -> Result<Self> {
        let config_dir = clockin_common::utils::config_dir();
        let data_dir = clockin_common::utils::data_dir();

        create_dir_all(&config_dir)
            .wrap_err_with(|| format!("Failed to create dir {config_dir:?}"))?;
        create_dir_all(&data_dir).wrap_err_with(|| format!("Failed to create dir {data_dir:?}"))?;

        let config_file = Self::config_file();

        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                create_dir_all(parent)
                    .wrap_err_with(|| format!("Failed to create dir {parent:?}"))?;
            }
            let mut file = File::create(&config_file).wrap_err("Failed to create config file")?;
            file.write_all(EXAMPLE_CONFIG.as_bytes())
                .wrap_err("Failed to write default config file")?;
        }

        Self::load(&config_file)
    }

    /// Expand `~` and environment variables in the path settings.
    pub fn expanded(mut self) -> Result<Self> {
        self.session_path = expand_shell(&self.session_path)?;
        self.log_dir = expand_shell(&self.log_dir)?;
        Ok(self)
    }
}

fn expand_shell(value: &str) -> Result<String> {
    Ok(shellexpand::full(value)?.to_string())
}
