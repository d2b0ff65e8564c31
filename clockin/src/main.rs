use clap::Parser;
use clockin::command::{ClockinCmd, Target};
use clockin::VERSION;
use eyre::Result;

#[derive(Parser)]
#[command(
    author = "Sam Uherek",
    version = VERSION,
    about = "Check in, check out and watch today's worked time",
    )]
struct Clockin {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    clockin: ClockinCmd,
}

impl Clockin {
    fn run(self) -> Result<()> {
        self.clockin.run(self.target)
    }
}

fn main() -> Result<()> {
    Clockin::parse().run()
}
