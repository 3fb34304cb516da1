//! CLI configuration: thin wrapper around `crm_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--backend, --insecure, --timeout).

use crm_core::CrmConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use crm_config::{
    Config, Profile, config_path, load_config_or_default, profile_to_crm_config, save_config,
    validate_backend_url,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `CrmConfig` from the config file, active profile, and flags.
///
/// Flags win over profile values. With no matching profile the built-in
/// defaults apply, unless `--profile` named one explicitly.
pub fn resolve_crm_config(global: &GlobalOpts) -> Result<CrmConfig, CliError> {
    let cfg = load_config_or_default();
    let name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profile(&name) {
        Ok(profile) => profile.clone(),
        Err(err) if global.profile.is_some() => {
            tracing::debug!(%err, "explicit profile missing");
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&cfg),
            });
        }
        Err(_) => Profile::default(),
    };

    if let Some(ref backend) = global.backend {
        profile.backend_url.clone_from(backend);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    tracing::debug!(profile = %name, backend = %profile.backend_url, "resolved configuration");
    Ok(profile_to_crm_config(&profile, &cfg.defaults)?)
}

pub fn available_profiles(cfg: &Config) -> String {
    let names = cfg.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
