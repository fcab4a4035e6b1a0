//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking passwords.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "model = \"{}\"", cfg.defaults.model);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "port = {}", p.port);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(timeout) = p.connect_timeout {
            let _ = writeln!(out, "connect_timeout = {timeout}");
        }
        if let Some(ref model) = p.model {
            let _ = writeln!(out, "model = \"{model}\"");
        }
    }

    out
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(format_config_redacted(&cfg).trim_end(), global.quiet);
            Ok(())
        }
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::Profile;

    #[test]
    fn passwords_are_masked() {
        let profile = Profile {
            host: "10.1.0.9".into(),
            port: 3337,
            username: Some("tech".into()),
            password: Some("hunter2".into()),
            password_env: Some("UNM_PW".into()),
            timeout: None,
            connect_timeout: Some(3),
            model: None,
        };
        let cfg = Config {
            profiles: HashMap::from([("lab".to_owned(), profile)]),
            ..Config::default()
        };

        let out = format_config_redacted(&cfg);
        assert!(out.contains("[profiles.lab]"));
        assert!(out.contains("password = \"****\""));
        assert!(out.contains("password_env = \"UNM_PW\""));
        assert!(out.contains("connect_timeout = 3"));
        assert!(!out.contains("hunter2"));
    }
}
