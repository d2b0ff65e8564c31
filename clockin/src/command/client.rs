use clap::{Args, Parser};
use clockin_client::api_client::AttendanceClient;
use clockin_client::settings::Settings;
use clockin_common::domain::EmployeeId;
use eyre::{Context, Result};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{self, fmt, prelude::*, EnvFilter};

mod attendance;
mod dashboard;
mod history;
mod info;
mod punch;
mod status;
mod watch;

/// Who the command acts for.
#[derive(Args, Debug, Clone, Default)]
pub struct Target {
    /// Employee id, overrides `employee_id` from the config
    #[arg(long, short, global = true)]
    pub employee: Option<String>,

    /// Tenant, overrides `company` from the config
    #[arg(long, global = true)]
    pub company: Option<String>,
}

#[derive(Parser, Debug)]
#[clap(infer_subcommands = true)]
pub enum Cmd {
    /// Show today's status and worked time
    Status,
    /// Start a session
    In,
    /// End the running session
    Out,
    /// Check in when checked out, check out otherwise
    Toggle,
    /// Recent check-ins
    History(history::Cmd),
    /// Per-day attendance over a timeframe
    Attendance(attendance::Cmd),
    /// Raw dashboard payload
    Dashboard,
    /// Live timer
    Watch,
    Info,
}

impl Cmd {
    #[tokio::main]
    pub async fn run(self, target: Target) -> Result<()> {
        let settings = Settings::new()?;
        let _guard = self.init_tracing(&settings)?;

        tracing::trace!(command = ?self, "client command");

        match self {
            Self::Status => status::run(&settings, &target).await,
            Self::In => punch::run(&settings, &target, punch::Punch::In).await,
            Self::Out => punch::run(&settings, &target, punch::Punch::Out).await,
            Self::Toggle => punch::run(&settings, &target, punch::Punch::Toggle).await,
            Self::History(cmd) => cmd.run(&settings, &target).await,
            Self::Attendance(cmd) => cmd.run(&settings, &target).await,
            Self::Dashboard => dashboard::run(&settings, &target).await,
            Self::Watch => watch::run(&settings, &target).await,
            Self::Info => {
                info::run(&settings, &target);
                Ok(())
            }
        }
    }

    /// The live view owns the terminal, so it logs to a file instead of stderr.
    fn init_tracing(&self, settings: &Settings) -> Result<Option<WorkerGuard>> {
        if let Self::Watch = self {
            fs_err::create_dir_all(&settings.log_dir)?;
            let appender = tracing_appender::rolling::never(&settings.log_dir, "clockin.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(EnvFilter::from_default_env())
                .init();

            return Ok(Some(guard));
        }

        color_eyre::install()?;
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();

        Ok(None)
    }
}

pub(crate) fn connect(
    settings: &Settings,
    target: &Target,
) -> Result<(Arc<AttendanceClient>, EmployeeId)> {
    let employee_id = settings.employee_id(target.employee.as_deref())?;
    let client = settings
        .api_client(target.company.as_deref())
        .wrap_err("Failed to connect")?;

    Ok((Arc::new(client), employee_id))
}
