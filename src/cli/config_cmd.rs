//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{is_valid_log_level, VALID_LOG_LEVELS};
use crate::domain::error::ConfigError;
use crate::domain::recorder::{MAX_MAX_DURATION_SECS, MIN_MAX_DURATION_SECS};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    match key {
        "max_duration" => config.max_duration = Some(parse_max_duration(value)?),
        "log_level" => config.log_level = Some(parse_log_level(value)?),
        _ => unreachable!(), // Already validated
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    let value = match key {
        "max_duration" => config.max_duration.map(|secs| secs.to_string()),
        "log_level" => config.log_level,
        _ => unreachable!(),
    };

    presenter.output(value.as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    presenter.key_value(
        "max_duration",
        &config
            .max_duration
            .map(|secs| secs.to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    );
    presenter.key_value("log_level", config.log_level.as_deref().unwrap_or(NOT_SET));

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

/// Parse a whole number of seconds within the recorder's bounds
fn parse_max_duration(value: &str) -> Result<u32, ConfigError> {
    let invalid = || ConfigError::ValidationError {
        key: "max_duration".to_string(),
        message: format!(
            "Value must be a whole number of seconds between {} and {}",
            MIN_MAX_DURATION_SECS, MAX_MAX_DURATION_SECS
        ),
    };

    let secs: u32 = value.trim().parse().map_err(|_| invalid())?;
    if (MIN_MAX_DURATION_SECS..=MAX_MAX_DURATION_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(invalid())
    }
}

fn parse_log_level(value: &str) -> Result<String, ConfigError> {
    if is_valid_log_level(value) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(ConfigError::ValidationError {
            key: "log_level".to_string(),
            message: format!(
                "Invalid value '{}'. Valid options: {}",
                value,
                VALID_LOG_LEVELS.join(", ")
            ),
        })
    }
}
