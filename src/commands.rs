//! Host commands: the settings a user can change and the startup checks.
//!
//! The non-interactive functions take the stores as trait objects and are
//! what the CLI subcommands call; the `prompt_*` and [`settings_menu`]
//! variants ask on the terminal first.

use dialoguer::{Confirm, Input, Password, Select};
use tracing::{debug, warn};

use crate::commit::DEFAULT_PROMPT;
use crate::config::{
    AUTO_COMMIT_ENABLED, ApiKey, CUSTOM_PROMPT, ConfigStore, GEMINI_API_KEY, SecretStore,
    SettingValue,
};
use crate::error::ConfigError;
use crate::git::check_git_installed;
use crate::watch::RepositoryRegistry;

/// Flip auto-commit and return the new value.
pub fn toggle_auto_commit(config: &dyn ConfigStore) -> Result<bool, ConfigError> {
    let enabled = !config.get_bool(AUTO_COMMIT_ENABLED, false)?;
    config.set(AUTO_COMMIT_ENABLED, SettingValue::Bool(enabled))?;
    Ok(enabled)
}

/// Store `key` trimmed. A blank key is ignored and `false` returned.
pub fn set_api_key(secrets: &dyn SecretStore, key: &str) -> Result<bool, ConfigError> {
    match ApiKey::new(key) {
        Some(key) => {
            secrets.set(GEMINI_API_KEY, key.expose())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Store the prompt template verbatim. A blank template means the built-in
/// default at generation time.
pub fn set_custom_prompt(config: &dyn ConfigStore, prompt: &str) -> Result<(), ConfigError> {
    config.set(CUSTOM_PROMPT, SettingValue::String(prompt.to_string()))
}

pub fn has_api_key(secrets: &dyn SecretStore) -> Result<bool, ConfigError> {
    Ok(secrets.get(GEMINI_API_KEY)?.and_then(ApiKey::new).is_some())
}

/// One-line summary of the settings, e.g. `aac  auto-commit: off  API key: set`.
pub fn status_line(config: &dyn ConfigStore, secrets: &dyn SecretStore) -> Result<String, ConfigError> {
    let auto = config.get_bool(AUTO_COMMIT_ENABLED, false)?;
    let key = has_api_key(secrets)?;
    Ok(format!(
        "aac  auto-commit: {}  API key: {}",
        if auto { "on" } else { "off" },
        if key { "set" } else { "not set" }
    ))
}

/// Ask for the API key without echoing it, then store it.
pub fn prompt_api_key(secrets: &dyn SecretStore) -> anyhow::Result<bool> {
    let key: String = Password::new()
        .with_prompt("Gemini API key (from Google AI Studio)")
        .allow_empty_password(true)
        .interact()?;
    Ok(set_api_key(secrets, &key)?)
}

/// Ask for a new template, pre-filled with the current one.
pub fn prompt_custom_prompt(config: &dyn ConfigStore) -> anyhow::Result<()> {
    let current = config.get_string(CUSTOM_PROMPT, DEFAULT_PROMPT)?;
    let prompt: String = Input::new()
        .with_prompt("Prompt template")
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?;
    set_custom_prompt(config, &prompt)?;
    Ok(())
}

/// Interactive menu over every setting.
pub fn settings_menu(config: &dyn ConfigStore, secrets: &dyn SecretStore) -> anyhow::Result<()> {
    let auto = config.get_bool(AUTO_COMMIT_ENABLED, false)?;
    let key = has_api_key(secrets)?;

    let items = [
        format!("Auto-commit: {}", if auto { "on" } else { "off" }),
        format!("API key: {}", if key { "set" } else { "not set" }),
        "Edit prompt template".to_string(),
        "Reset prompt template to default".to_string(),
    ];

    let Some(choice) = Select::new()
        .with_prompt("aac settings")
        .items(&items)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };

    match choice {
        0 => {
            let enabled = toggle_auto_commit(config)?;
            println!("Auto-commit {}.", if enabled { "enabled" } else { "disabled" });
        }
        1 => {
            if prompt_api_key(secrets)? {
                println!("Gemini API key saved.");
            }
        }
        2 => {
            prompt_custom_prompt(config)?;
            println!("Prompt template saved.");
        }
        3 => {
            set_custom_prompt(config, DEFAULT_PROMPT)?;
            println!("Prompt template reset to default.");
        }
        _ => {}
    }
    Ok(())
}

/// Startup checks before watching: git must be installed, at least one
/// repository should be registered, and a missing API key is offered for
/// setup when a terminal is attached.
pub async fn initialize(
    registry: &RepositoryRegistry,
    secrets: &dyn SecretStore,
    interactive: bool,
) -> anyhow::Result<()> {
    check_git_installed().await?;

    if registry.is_empty() {
        warn!("No git repository to watch");
        eprintln!("aac: no git repository found. Pass a path inside a repository.");
    }

    if !has_api_key(secrets)? {
        eprintln!("aac needs a Gemini API key to generate commit messages.");
        if interactive
            && Confirm::new()
                .with_prompt("Set the API key now?")
                .default(true)
                .interact()?
            && prompt_api_key(secrets)?
        {
            println!("Gemini API key saved.");
        }
    }

    debug!("Initialized with {} repositories", registry.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MockConfigStore, MockSecretStore};

    #[test]
    fn test_toggle_flips_and_persists() {
        let mut config = MockConfigStore::new();
        config
            .expect_get_bool()
            .withf(|name, _| name == AUTO_COMMIT_ENABLED)
            .returning(|_, _| Ok(false));
        config
            .expect_set()
            .withf(|name, value| name == AUTO_COMMIT_ENABLED && *value == SettingValue::Bool(true))
            .times(1)
            .returning(|_, _| Ok(()));

        assert!(toggle_auto_commit(&config).unwrap());
    }

    #[test]
    fn test_set_api_key_trims() {
        let mut secrets = MockSecretStore::new();
        secrets
            .expect_set()
            .withf(|key, value| key == GEMINI_API_KEY && value == "AIza-key")
            .times(1)
            .returning(|_, _| Ok(()));

        assert!(set_api_key(&secrets, "  AIza-key \n").unwrap());
    }

    #[test]
    fn test_blank_api_key_not_stored() {
        let mut secrets = MockSecretStore::new();
        secrets.expect_set().never();

        assert!(!set_api_key(&secrets, "   ").unwrap());
    }

    #[test]
    fn test_set_custom_prompt_stores_verbatim() {
        let mut config = MockConfigStore::new();
        config
            .expect_set()
            .withf(|name, value| {
                name == CUSTOM_PROMPT && *value == SettingValue::String("  line one\nline two".into())
            })
            .times(1)
            .returning(|_, _| Ok(()));

        set_custom_prompt(&config, "  line one\nline two").unwrap();
    }

    #[test]
    fn test_status_line() {
        let mut config = MockConfigStore::new();
        config.expect_get_bool().returning(|_, _| Ok(true));
        let mut secrets = MockSecretStore::new();
        secrets.expect_get().returning(|_| Ok(None));

        assert_eq!(
            status_line(&config, &secrets).unwrap(),
            "aac  auto-commit: on  API key: not set"
        );
    }

    #[test]
    fn test_blank_stored_key_counts_as_missing() {
        let mut secrets = MockSecretStore::new();
        secrets.expect_get().returning(|_| Ok(Some(" ".into())));
        assert!(!has_api_key(&secrets).unwrap());
    }
}
