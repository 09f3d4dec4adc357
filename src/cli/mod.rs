// src/cli/mod.rs

use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// actio: runs registered actions, binding command-line options onto them.
///
/// The first argument names the action; everything after it is handed to that
/// action. With no action, the default action runs.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to the engine configuration file. Defaults to `~/.config/actio/actio.toml`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Never substitute a mistyped action name, even when the match is close.
    #[arg(long)]
    pub no_typo_correction: bool,

    /// The action to run. Options in its place go to the default action.
    #[arg(allow_hyphen_values = true)]
    pub target: Option<String>,

    /// Arguments passed to the action, untouched.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// The action's argument vector, target first, the way `dispatch_args` expects it.
    pub fn into_argv(self) -> Vec<String> {
        self.target.into_iter().chain(self.args).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_after_target_belong_to_the_action() {
        let cli = Cli::try_parse_from(["actio", "--no-typo-correction", "copy", "--force", "-v", "a"]).unwrap();
        assert!(cli.no_typo_correction);
        assert_eq!(cli.target.as_deref(), Some("copy"));
        assert_eq!(cli.args, ["--force", "-v", "a"]);
    }

    #[test]
    fn test_leading_action_option_is_kept_for_the_default_action() {
        let cli = Cli::try_parse_from(["actio", "-l", "notes.txt"]).unwrap();
        assert_eq!(cli.target.as_deref(), Some("-l"));
        assert_eq!(cli.into_argv(), ["-l", "notes.txt"]);

        let cli = Cli::try_parse_from(["actio", "--config", "a.toml", "--topic", "echo"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("a.toml"));
        assert_eq!(cli.into_argv(), ["--topic", "echo"]);
    }

    #[test]
    fn test_no_target() {
        let cli = Cli::try_parse_from(["actio", "--config", "~/x.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("~/x.toml"));
        assert!(cli.into_argv().is_empty());
    }
}
