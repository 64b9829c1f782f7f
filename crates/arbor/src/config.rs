//! CLI configuration: a thin wrapper around `arbor_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --tree, --insecure, ...).

use clap::ValueEnum;

use arbor_core::{BusyPolicy, SyncConfig};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use arbor_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Fill `--output` and `--color` from `[defaults]` when not given.
///
/// Unrecognized values in the file fall back to the built-in defaults.
pub fn apply_defaults(global: &mut GlobalOpts, config: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&config.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&config.defaults.color, true).ok();
    }
}

/// Build the `SyncConfig` for this invocation.
///
/// Uses the active profile when it exists, with flag overrides on top.
/// Without a profile, `--url` and `--tree` alone are enough.
pub fn build_sync_config(global: &GlobalOpts, config: &Config) -> Result<SyncConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    if let Some(profile) = config.profiles.get(&profile_name) {
        return resolve_profile(profile, config, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(config),
        });
    }

    let url = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let tree = global.tree.as_deref().ok_or_else(|| CliError::Validation {
        field: "tree".into(),
        reason: "no tree name given; pass --tree or set it in a profile".into(),
    })?;

    resolve_profile(&Profile::new(url, tree), config, global)
}

/// Translate a `Profile` + global flags into a `SyncConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    config: &Config,
    global: &GlobalOpts,
) -> Result<SyncConfig, CliError> {
    let mut merged = profile.clone();
    if let Some(ref url) = global.url {
        merged.url.clone_from(url);
    }
    if let Some(ref tree) = global.tree {
        merged.tree.clone_from(tree);
    }
    if global.namespace.is_some() {
        merged.namespace.clone_from(&global.namespace);
    }
    if global.insecure {
        merged.insecure = Some(true);
    }
    if global.timeout.is_some() {
        merged.timeout = global.timeout;
    }
    if global.queue {
        merged.busy_policy = Some(BusyPolicy::Queue);
    }

    Ok(arbor_config::profile_to_sync_config(&merged, &config.defaults)?)
}
