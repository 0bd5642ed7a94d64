use crate::melt::settings::MeltSettings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub const MELT_SETTINGS_FILE_NAME: &str = "melt_settings.json";

pub fn executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    exe_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))
}

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(MELT_SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}

pub fn load() -> Result<MeltSettings> {
    let path = resolve_settings_path()?;
    load_from_path(&path)
}

pub fn save(settings: &MeltSettings) -> Result<PathBuf> {
    let path = resolve_settings_path()?;
    save_to_path(&path, settings)?;
    Ok(path)
}

/// Reads settings from `path`. A missing or blank file yields the defaults.
pub fn load_from_path(path: &Path) -> Result<MeltSettings> {
    if !path.exists() {
        return Ok(MeltSettings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read melt settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(MeltSettings::default());
    }

    let mut loaded: MeltSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize melt settings file {}", path.display()))?;
    loaded.sanitize();
    Ok(loaded)
}

pub fn save_to_path(path: &Path, settings: &MeltSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create melt settings parent folder {}", parent.display()))?;
    }
    let json =
        serde_json::to_string_pretty(settings).context("serialize melt settings payload")?;
    std::fs::write(path, json)
        .with_context(|| format!("write melt settings file {}", path.display()))?;
    Ok(())
}
