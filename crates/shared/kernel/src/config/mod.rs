use config::{Config, Environment, File, Source};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides (`STRATA__REGISTRY__MAX_TEAMS=8`).
pub const ENV_PREFIX: &str = "STRATA";

/// Custom error type for config loading.
#[strata_derive::strata_error]
pub enum ConfigError {
    #[kind(InvalidArgument)]
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration that combines file-based settings with environment overrides.
///
/// 1. **Base File**: settings from a TOML/YAML/JSON file. Without a path the `strata`
///    file in the working directory is used (any supported extension).
/// 2. **Environment Overrides**: variables prefixed with `STRATA__`; nested keys use
///    double underscores (`STRATA__TOPOLOGY__MODULE_SEPARATOR` maps to
///    `topology.module_separator`).
///
/// # Errors
/// Returns [`ConfigError`] if the file cannot be found or read, or if the merged
/// sources do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use strata_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("strata"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Same as [`load_config`] but falls back to `T::default()` layered with environment
/// overrides when `path` is `None` and no default file exists.
///
/// # Errors
/// Returns [`ConfigError`] for unreadable files or malformed values.
pub fn load_config_or_default<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if let Some(path) = path {
        return load_config(Some(path));
    }

    let config = Config::builder()
        .add_source(File::with_name("strata").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build config")?;

    if config.collect().map(|map| map.is_empty()).unwrap_or(true) {
        return Ok(T::default());
    }

    Ok(config.try_deserialize::<T>().context("Failed to deserialize config")?)
}
