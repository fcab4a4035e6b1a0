//! CLI-specific configuration: merges global flags over the shared
//! `ponctl-config` profiles.

use std::time::Duration;

use ponctl_api::{ClientConfig, DEFAULT_UNM_PORT};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use ponctl_config::{Config, Profile, config_path, load_config};

/// Everything a command needs to reach the UNM server.
#[derive(Debug)]
pub struct ConnectionSettings {
    pub client: ClientConfig,
    /// ONU model used when provisioning does not name one.
    pub model: String,
}

impl ConnectionSettings {
    pub fn timeout(&self) -> Duration {
        self.client.timeout
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Resolve connection settings. Flags win over the profile, the profile
/// wins over `[defaults]`.
pub fn resolve_settings(global: &GlobalOpts, config: &Config) -> Result<ConnectionSettings, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = config.profiles.get(&profile_name);

    if profile.is_none() && global.profile.is_some() {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    let host = global
        .host
        .clone()
        .or_else(|| profile.map(|p| p.host.clone()))
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;

    let merged = Profile {
        host,
        port: global
            .port
            .or_else(|| profile.map(|p| p.port))
            .unwrap_or(DEFAULT_UNM_PORT),
        username: global
            .username
            .clone()
            .or_else(|| profile.and_then(|p| p.username.clone())),
        password: profile.and_then(|p| p.password.clone()),
        password_env: profile.and_then(|p| p.password_env.clone()),
        timeout: Some(
            global
                .timeout
                .or_else(|| profile.and_then(|p| p.timeout))
                .unwrap_or(config.defaults.timeout),
        ),
        connect_timeout: profile.and_then(|p| p.connect_timeout),
        model: None,
    };

    let client = ponctl_config::profile_to_client_config(&merged, &profile_name)?;
    let model = profile
        .and_then(|p| p.model.clone())
        .unwrap_or_else(|| config.defaults.model.clone());

    Ok(ConnectionSettings { client, model })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["ponctl"];
        argv.extend_from_slice(args);
        argv.push("ping");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_lab() -> Config {
        let profile = Profile {
            host: "10.1.0.9".into(),
            port: 3337,
            username: Some("tech".into()),
            password: Some("pw".into()),
            password_env: None,
            timeout: Some(45),
            connect_timeout: None,
            model: Some("HG6143D".into()),
        };
        Config {
            default_profile: Some("lab".into()),
            profiles: HashMap::from([("lab".to_owned(), profile)]),
            ..Config::default()
        }
    }

    #[test]
    fn flags_override_profile() {
        let settings = resolve_settings(
            &global(&["--host", "10.9.9.9", "--port", "4000", "--timeout", "5"]),
            &config_with_lab(),
        )
        .unwrap();

        assert_eq!(settings.client.transport.address(), "10.9.9.9:4000");
        assert_eq!(settings.client.username, "tech");
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(settings.model, "HG6143D");
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let settings = resolve_settings(&global(&[]), &config_with_lab()).unwrap();
        assert_eq!(settings.client.transport.address(), "10.1.0.9:3337");
        assert_eq!(settings.timeout(), Duration::from_secs(45));
    }

    #[test]
    fn unknown_explicit_profile_is_reported() {
        let err = resolve_settings(&global(&["--profile", "nope"]), &config_with_lab()).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "nope");
                assert_eq!(available, "lab");
            }
            other => panic!("expected ProfileNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn no_host_anywhere_is_no_config() {
        let err = resolve_settings(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
