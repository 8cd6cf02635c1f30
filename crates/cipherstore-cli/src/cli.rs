use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "cipherstore",
    about = "Encrypted-at-rest preference store",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; defaults to listing stored preferences.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version and exit.
    Version,
    /// Round-trip a probe value through the encrypted store.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print every stored preference.
    List,
    /// Print the value stored under a key.
    Get { key: String },
    /// Store a value under a key.
    Set { key: String, value: String },
    /// Remove a key.
    Unset { key: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_none_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["cipherstore"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_health_subcommand() {
        let cli = Cli::try_parse_from(["cipherstore", "health"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Health));
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli = Cli::try_parse_from(["cipherstore", "config", "init"])
            .expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }

    #[test]
    fn parses_set_with_key_and_value() {
        let cli = Cli::try_parse_from(["cipherstore", "set", "theme", "dark"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Set {
                key: "theme".into(),
                value: "dark".into(),
            })
        );
    }

    #[test]
    fn get_requires_a_key() {
        assert!(Cli::try_parse_from(["cipherstore", "get"]).is_err());
    }
}
