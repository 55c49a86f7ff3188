use engram_core::settings::save_to_path;

use crate::config::{load_settings, settings_path, SettingsArgs};
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "settings")]
#[command(about = "Show or save reader settings")]
pub struct App {
    #[clap(flatten)]
    overrides: SettingsArgs,

    /// Save the effective settings to the settings file
    #[arg(long)]
    write: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let settings = load_settings(&global, &app.overrides)?;

    if app.write {
        let path = settings_path(&global)?;
        save_to_path(&path, &settings).map_err(|e| Error::Config(e.to_string()))?;
        eprintln!("{}", f!("Saved settings to {}", path.display()).green());
    }

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
