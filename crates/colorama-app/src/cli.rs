//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "colorama")]
#[command(about = "Manage saved Colorama projects", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List saved projects, newest first
    List,
    /// Export a saved project to an image file
    Export {
        /// Project id, as shown by `list`
        id: String,
        /// Output path; the extension picks the format (png, jpg, svg, gif)
        out: PathBuf,
    },
    /// Print the keyboard shortcuts
    Shortcuts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from(["colorama", "export", "abc", "out.png"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Export {
                id: "abc".into(),
                out: PathBuf::from("out.png"),
            }
        );
    }

    #[test]
    fn test_missing_argument_is_an_error() {
        let err = Cli::try_parse_from(["colorama", "export", "onlyone"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_unknown_or_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["colorama", "paint"]).is_err());
        assert!(Cli::try_parse_from(["colorama"]).is_err());
        assert_eq!(
            Cli::try_parse_from(["colorama", "list"]).unwrap().command,
            Command::List
        );
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
