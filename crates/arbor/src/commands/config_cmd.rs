//! Config subcommand handlers.

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const DEFAULT_URL: &str = "https://test.vmarmysh.com";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: guided setup, or straight from --url/--tree ───────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            let mut cfg = config::load_config_or_default();

            let (profile_name, url, tree) = match (&global.url, &global.tree) {
                (Some(url), Some(tree)) => (
                    global.profile.clone().unwrap_or_else(|| "default".into()),
                    url.clone(),
                    tree.clone(),
                ),
                _ => {
                    eprintln!("arbor configuration");
                    eprintln!("   Config path: {}\n", config_path.display());
                    prompt_profile(global)?
                }
            };

            let mut profile = Profile::new(url, tree);
            profile.namespace.clone_from(&global.namespace);
            if global.insecure {
                profile.insecure = Some(true);
            }

            // Reject a profile that could never connect before writing it.
            let probe = Config {
                defaults: cfg.defaults.clone(),
                ..Config::default()
            };
            config::resolve_profile(&profile, &probe, global)?;

            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg
                .default_profile
                .as_ref()
                .is_none_or(|name| !cfg.profiles.contains_key(name))
            {
                cfg.default_profile = Some(profile_name.clone());
            }

            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
                eprintln!("  Profile: {profile_name}");
                eprintln!("\n  Test it: arbor show");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output_format(), &cfg, |c| {
                Ok(toml::to_string_pretty(c)?)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

/// Ask for profile name, URL, and tree name, using flags as defaults.
fn prompt_profile(global: &GlobalOpts) -> Result<(String, String, String), CliError> {
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("Service URL")
        .default(global.url.clone().unwrap_or_else(|| DEFAULT_URL.into()))
        .interact_text()
        .map_err(prompt_err)?;

    let mut tree_input = Input::<String>::new().with_prompt("Tree name");
    if let Some(ref tree) = global.tree {
        tree_input = tree_input.default(tree.clone());
    }
    let tree = tree_input.interact_text().map_err(prompt_err)?;

    Ok((profile_name, url, tree))
}
