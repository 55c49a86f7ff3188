use crate::prelude::*;
use clap::Parser;

mod blocks;
mod config;
mod document;
mod error;
mod prelude;
mod read;
mod settings;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Speed-read PDF documents one word at a time, pausing before headings, lists, tables and figures"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Settings file (defaults to <config dir>/engram/settings.toml)
    #[clap(long, env = "ENGRAM_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "ENGRAM_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Print the blocks extracted from a PDF
    Blocks(crate::blocks::App),

    /// Read a PDF word by word
    Read(crate::read::App),

    /// Show or save reader settings
    Settings(crate::settings::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    let default_filter = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    color_eyre::install()?;

    match app.command {
        SubCommands::Blocks(sub_app) => crate::blocks::run(sub_app, app.global).await,
        SubCommands::Read(sub_app) => crate::read::run(sub_app, app.global).await,
        SubCommands::Settings(sub_app) => crate::settings::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
