#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use desktop_melt::logging;
use desktop_melt::melt::settings::MeltSettings;
use desktop_melt::melt::{run, settings_store};

fn main() -> anyhow::Result<()> {
    let settings_path = settings_store::resolve_settings_path().ok();
    let first_run = settings_path.as_ref().is_some_and(|path| !path.exists());
    let loaded = settings_store::load();
    let debug = loaded
        .as_ref()
        .map(|settings| settings.debug_logging)
        .unwrap_or(false);
    let log_dir = settings_store::executable_dir().ok();
    let _guard = logging::init(debug, log_dir.as_deref());

    let settings = match loaded {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(?err, "using default settings");
            MeltSettings::default()
        }
    };

    if first_run {
        match settings_store::save(&settings) {
            Ok(path) => tracing::info!(path = %path.display(), "wrote default settings"),
            Err(err) => tracing::warn!(?err, "could not write default settings"),
        }
    }

    let reason = run(&settings).map_err(|err| {
        tracing::error!(?err, "desktop melt failed");
        err
    })?;
    tracing::info!(?reason, "exiting");
    Ok(())
}
