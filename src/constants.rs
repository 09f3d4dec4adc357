// src/constants.rs

/// Prefix of a named option on the command line and in option descriptions.
pub const LONG_PREFIX: &str = "--";

/// Prefix of a single-character alias option.
pub const SHORT_PREFIX: char = '-';

/// Literal value bound to flags that appear without a value.
pub const FLAG_VALUE: &str = "true";

/// Separates the name from the alias in an option description (`--name|n`).
pub const ALIAS_SEPARATOR: char = '|';

/// Candidates whose normalized edit distance exceeds this are never suggested.
pub const TYPO_REJECTION_CEILING: f64 = 0.6;

/// Default acceptance threshold below which a mistyped target is silently corrected.
pub const DEFAULT_TYPO_THRESHOLD: f64 = 0.4;

/// Name of the strategy used when an action does not pick one.
pub const DEFAULT_STRATEGY: &str = "members";

/// Name of the engine's directory inside the user's config directory.
pub const CONFIG_DIR_NAME: &str = "actio";

/// The name of the engine configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "actio.toml";
