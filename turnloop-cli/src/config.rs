use anyhow::{Context, Result};
use std::path::PathBuf;
use turnloop_workflow::LoopConfig;

/// Environment variable pointing at a loop configuration file.
pub const ENV_CONFIG_PATH: &str = "TURNLOOP_CONFIG";

/// Resolves the loop configuration for `refine`.
///
/// An explicit path wins over `TURNLOOP_CONFIG`; without either the bundled
/// refiner configuration is used. Environment overrides apply last.
pub fn load_refiner_config(explicit: Option<PathBuf>) -> Result<LoopConfig> {
    load_refiner_config_from(explicit, |key| std::env::var(key).ok())
}

pub fn load_refiner_config_from<F>(explicit: Option<PathBuf>, lookup: F) -> Result<LoopConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let path = explicit.or_else(|| lookup(ENV_CONFIG_PATH).map(PathBuf::from));

    let mut config = match path {
        Some(path) => LoopConfig::from_file(&path)
            .with_context(|| format!("failed to load loop configuration from {}", path.display()))?,
        None => crate::scenarios::default_refiner_config()?,
    };
    config.apply_overrides_from(lookup)?;
    Ok(config)
}
