use clap::Subcommand;
use eyre::Result;

mod client;

pub use client::Target;

#[derive(Subcommand)]
pub enum ClockinCmd {
    #[command(flatten)]
    Client(client::Cmd),
}

impl ClockinCmd {
    pub fn run(self, target: Target) -> Result<()> {
        match self {
            Self::Client(cmd) => cmd.run(target),
        }
    }
}
