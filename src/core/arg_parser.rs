// src/core/arg_parser.rs

use crate::constants::{FLAG_VALUE, LONG_PREFIX, SHORT_PREFIX};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("Option name missing after '{token}' (argument {position}).")]
    MissingName { token: String, position: usize },
}

/// One classified command-line token, in the order it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgToken {
    /// `--name` or `--name value`.
    Named { name: String, value: Option<String> },
    /// `-a value`. Only a two-character alias token can take a value.
    Alias { alias: char, value: String },
    /// `-abc`, or a lone `-a` with nothing to take: each character is a boolean flag.
    Cluster(Vec<char>),
    Positional(String),
}

impl ArgToken {
    /// Number of raw arguments this token was built from.
    pub fn width(&self) -> usize {
        match self {
            Self::Named { value: Some(_), .. } | Self::Alias { .. } => 2,
            Self::Named { value: None, .. } | Self::Cluster(_) | Self::Positional(_) => 1,
        }
    }
}

/// The classified form of a raw argument vector.
///
/// Named and aliased values keep their raw text; no conversion happens at this
/// layer. When a name or alias repeats, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    named: HashMap<String, String>,
    aliased: HashMap<char, String>,
    positional: Vec<String>,
    tokens: Vec<ArgToken>,
}

fn is_prefixed(param: &str) -> bool {
    param.starts_with(SHORT_PREFIX)
}

impl ParsedArgs {
    /// Classifies the raw CLI parameters.
    ///
    /// # Logic:
    /// - `--name` takes the next token as its value unless there is none or it is
    ///   itself prefixed, in which case it is a flag bound to `"true"`.
    /// - `-a value` binds `value` to alias `a`. Any other single-dash token is a
    ///   cluster of boolean alias flags.
    /// - Everything else is positional, in order.
    pub fn parse<S: AsRef<str>>(cli_params: &[S]) -> Result<Self, TokenizeError> {
        let mut parsed = Self::default();
        let mut params_iter = cli_params
            .iter()
            .map(AsRef::as_ref)
            .enumerate()
            .peekable();

        while let Some((position, param)) = params_iter.next() {
            let token = if let Some(name) = param.strip_prefix(LONG_PREFIX) {
                if name.is_empty() {
                    return Err(TokenizeError::MissingName {
                        token: param.to_string(),
                        position,
                    });
                }
                let value = params_iter
                    .next_if(|(_, next)| !is_prefixed(next))
                    .map(|(_, next)| next.to_string());
                ArgToken::Named {
                    name: name.to_string(),
                    value,
                }
            } else if let Some(cluster) = param.strip_prefix(SHORT_PREFIX) {
                let mut chars = cluster.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => {
                        return Err(TokenizeError::MissingName {
                            token: param.to_string(),
                            position,
                        });
                    }
                    (Some(alias), None) => {
                        match params_iter.next_if(|(_, next)| !is_prefixed(next)) {
                            Some((_, value)) => ArgToken::Alias {
                                alias,
                                value: value.to_string(),
                            },
                            None => ArgToken::Cluster(vec![alias]),
                        }
                    }
                    (Some(_), Some(_)) => ArgToken::Cluster(cluster.chars().collect()),
                }
            } else {
                ArgToken::Positional(param.to_string())
            };

            log::trace!("Argument {} classified as {:?}", position, token);
            parsed.record(token);
        }

        Ok(parsed)
    }

    fn record(&mut self, token: ArgToken) {
        match &token {
            ArgToken::Named { name, value } => {
                let value = value.clone().unwrap_or_else(|| FLAG_VALUE.to_string());
                self.named.insert(name.clone(), value);
            }
            ArgToken::Alias { alias, value } => {
                self.aliased.insert(*alias, value.clone());
            }
            ArgToken::Cluster(flags) => {
                for flag in flags {
                    self.aliased.insert(*flag, FLAG_VALUE.to_string());
                }
            }
            ArgToken::Positional(value) => self.positional.push(value.clone()),
        }
        self.tokens.push(token);
    }

    pub fn named(&self) -> &HashMap<String, String> {
        &self.named
    }

    pub fn aliased(&self) -> &HashMap<char, String> {
        &self.aliased
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// The classified tokens in their original order.
    pub fn tokens(&self) -> &[ArgToken] {
        &self.tokens
    }

    /// Number of raw arguments accounted for by the classified tokens.
    /// Always equals the length of the input that was parsed.
    pub fn token_count(&self) -> usize {
        self.tokens.iter().map(ArgToken::width).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(params: &[&str]) -> ParsedArgs {
        ParsedArgs::parse(params).unwrap()
    }

    #[test]
    fn test_named_with_value_and_flag() {
        let parsed = parse(&["--env", "staging", "--verbose", "--dry-run"]);
        assert_eq!(parsed.named().get("env").map(String::as_str), Some("staging"));
        assert_eq!(parsed.named().get("verbose").map(String::as_str), Some("true"));
        assert_eq!(parsed.named().get("dry-run").map(String::as_str), Some("true"));
        assert!(parsed.positional().is_empty());
    }

    #[test]
    fn test_named_flag_before_alias_token() {
        let parsed = parse(&["--all", "-v"]);
        assert_eq!(parsed.named().get("all").map(String::as_str), Some("true"));
        assert_eq!(parsed.aliased().get(&'v').map(String::as_str), Some("true"));
    }

    #[test]
    fn test_alias_takes_following_value() {
        let parsed = parse(&["-o", "out.txt", "input"]);
        assert_eq!(parsed.aliased().get(&'o').map(String::as_str), Some("out.txt"));
        assert_eq!(parsed.positional(), ["input".to_string()]);
    }

    #[test]
    fn test_cluster_sets_every_flag() {
        let parsed = parse(&["-xvf", "archive.tar"]);
        for flag in ['x', 'v', 'f'] {
            assert_eq!(parsed.aliased().get(&flag).map(String::as_str), Some("true"));
        }
        // A cluster never takes a value.
        assert_eq!(parsed.positional(), ["archive.tar".to_string()]);
    }

    #[test]
    fn test_lone_alias_at_end_is_flag() {
        let parsed = parse(&["file", "-q"]);
        assert_eq!(parsed.aliased().get(&'q').map(String::as_str), Some("true"));
        assert_eq!(parsed.tokens().last(), Some(&ArgToken::Cluster(vec!['q'])));
    }

    #[test]
    fn test_positional_order_is_kept() {
        let parsed = parse(&["a", "--k", "v", "b", "c"]);
        assert_eq!(parsed.positional(), ["a", "b", "c"].map(String::from));
    }

    #[test]
    fn test_bare_prefixes_are_syntax_errors() {
        assert_eq!(
            ParsedArgs::parse(&["ok", "--"]),
            Err(TokenizeError::MissingName {
                token: "--".to_string(),
                position: 1
            })
        );
        assert!(ParsedArgs::parse(&["-"]).is_err());
    }

    #[test]
    fn test_repeated_name_last_wins() {
        let parsed = parse(&["--level", "1", "--level", "2"]);
        assert_eq!(parsed.named().get("level").map(String::as_str), Some("2"));
        assert_eq!(parsed.token_count(), 4);
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse(&[]);
        assert!(parsed.is_empty());
        assert_eq!(parsed.token_count(), 0);
    }

    proptest! {
        #[test]
        fn property_tokens_partition_the_input(
            params in prop::collection::vec(
                prop_oneof![
                    "--[a-z]{1,6}",
                    "-[a-z]{1,3}",
                    "[a-z0-9.]{1,6}",
                ],
                0..12,
            )
        ) {
            let parsed = ParsedArgs::parse(&params).unwrap();
            prop_assert_eq!(parsed.token_count(), params.len());

            let positional_tokens = parsed
                .tokens()
                .iter()
                .filter(|t| matches!(t, ArgToken::Positional(_)))
                .count();
            prop_assert_eq!(positional_tokens, parsed.positional().len());
        }
    }
}
