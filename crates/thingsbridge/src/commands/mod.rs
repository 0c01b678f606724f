//! One handler per subcommand. Each loads config, runs against a
//! `Bridge`, and prints through `Printer`.

pub mod attributes;
pub mod entries;
pub mod points;
pub mod setup;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Setup(args) => setup::handle(args, global).await,
        Command::Entries(args) => entries::handle(args, global),
        Command::Points(args) => points::handle(args, global).await,
        Command::Set(args) => attributes::handle_set(args, global).await,
        Command::SetMany(args) => attributes::handle_set_many(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        // Generated in main before dispatch
        Command::Completions(_) => Ok(()),
    }
}
