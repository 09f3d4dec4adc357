// src/core/grammar.rs

//! # Option Description Grammar
//!
//! Parses the one-line description language an action can use instead of
//! declaring each option separately:
//!
//! ```text
//! source [destination] --mode|m [--force|f --depth]
//! ```
//!
//! - Bare words declare positional options, indexed from 0 in declaration order.
//! - `--name`, `--name|a` and `--a|name` declare named options, with an
//!   optional single-character alias on either side of the `|`.
//! - `[` ... `]` marks an optional section. Sections do not nest.
//! - Everything declared outside a section is required.

use crate::{
    constants::{ALIAS_SEPARATOR, LONG_PREFIX},
    models::OptionDescriptor,
};
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

const SECTION_OPEN: char = '[';
const SECTION_CLOSE: char = ']';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("Optional sections cannot be nested (offset {offset}).")]
    NestedSection { offset: usize },
    #[error("Unmatched ']' (offset {offset}).")]
    UnmatchedClose { offset: usize },
    #[error("Optional section opened at offset {offset} is never closed.")]
    UnclosedSection { offset: usize },
    #[error("Option name missing (offset {offset}).")]
    MissingName { offset: usize },
    #[error("Option '{token}' has more than one alias separator (offset {offset}).")]
    TooManyParts { token: String, offset: usize },
    #[error("Option '{token}' has an empty name or alias (offset {offset}).")]
    EmptyPart { token: String, offset: usize },
    #[error("Option name '{token}' must be at least two characters long (offset {offset}).")]
    NameTooShort { token: String, offset: usize },
    #[error(
        "Option '{token}' needs exactly one single-character alias and a name of at least two characters (offset {offset})."
    )]
    InvalidAliasPair { token: String, offset: usize },
    #[error("Option '{0}' is declared more than once.")]
    DuplicateName(String),
    #[error("Alias '-{0}' is declared more than once.")]
    DuplicateAlias(char),
}

/// Parses an option description into descriptors, in declaration order.
///
/// The descriptors carry `ValueType::Text` and no default value; strategies
/// refine both once the action's accessors are known.
pub fn parse(description: &str) -> Result<Vec<OptionDescriptor>, GrammarError> {
    log::debug!("Parsing option description: '{}'", description);
    let mut parser = Parser {
        source: description,
        chars: description.char_indices().peekable(),
        next_index: 0,
        descriptors: Vec::new(),
    };
    parser.parse_sequence(None)?;

    let descriptors = parser.descriptors;
    check_duplicates(&descriptors)?;
    log::debug!("Parsed {} option descriptor(s)", descriptors.len());
    Ok(descriptors)
}

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    next_index: usize,
    descriptors: Vec<OptionDescriptor>,
}

impl<'a> Parser<'a> {
    /// Parses tokens until end of input or, inside a section, until the closing bracket.
    /// `section` holds the offset of the enclosing `[`, if any.
    fn parse_sequence(&mut self, section: Option<usize>) -> Result<(), GrammarError> {
        loop {
            self.skip_whitespace();
            let Some(&(byte, c)) = self.chars.peek() else {
                return match section {
                    Some(open) => Err(GrammarError::UnclosedSection { offset: open }),
                    None => Ok(()),
                };
            };
            let offset = self.char_offset(byte);

            match c {
                SECTION_OPEN => {
                    if section.is_some() {
                        return Err(GrammarError::NestedSection { offset });
                    }
                    self.chars.next();
                    self.parse_sequence(Some(offset))?;
                }
                SECTION_CLOSE => {
                    self.chars.next();
                    return match section {
                        Some(_) => Ok(()),
                        None => Err(GrammarError::UnmatchedClose { offset }),
                    };
                }
                _ => {
                    let word = self.take_word(byte);
                    self.declare(word, offset, section.is_none())?;
                }
            }
        }
    }

    /// Errors report positions in characters, not bytes.
    fn char_offset(&self, byte: usize) -> usize {
        self.source.get(..byte).map_or(byte, |head| head.chars().count())
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    /// Consumes a run of characters up to whitespace or a bracket.
    fn take_word(&mut self, start: usize) -> &'a str {
        let mut end = start;
        while let Some((offset, c)) = self
            .chars
            .next_if(|&(_, c)| !c.is_whitespace() && c != SECTION_OPEN && c != SECTION_CLOSE)
        {
            end = offset + c.len_utf8();
        }
        self.source.get(start..end).unwrap_or_default()
    }

    fn declare(&mut self, word: &str, offset: usize, required: bool) -> Result<(), GrammarError> {
        let mut descriptor = match word.strip_prefix(LONG_PREFIX) {
            Some(spec) => named_option(word, spec, offset)?,
            None => {
                let descriptor = OptionDescriptor::positional(word, self.next_index);
                self.next_index += 1;
                descriptor
            }
        };
        descriptor.required = required;
        log::trace!("Declared option {} (required: {})", descriptor, required);
        self.descriptors.push(descriptor);
        Ok(())
    }
}

/// Splits `name|a` or `a|name` into a named descriptor.
fn named_option(token: &str, spec: &str, offset: usize) -> Result<OptionDescriptor, GrammarError> {
    if spec.is_empty() {
        return Err(GrammarError::MissingName { offset });
    }

    let parts: Vec<&str> = spec.split(ALIAS_SEPARATOR).collect();
    let error_token = || token.to_string();

    match parts.as_slice() {
        [name] => {
            if name.chars().count() < 2 {
                return Err(GrammarError::NameTooShort {
                    token: error_token(),
                    offset,
                });
            }
            Ok(OptionDescriptor::named(*name))
        }
        [first, second] => {
            if first.is_empty() || second.is_empty() {
                return Err(GrammarError::EmptyPart {
                    token: error_token(),
                    offset,
                });
            }
            let (name, alias) = match (single_char(first), single_char(second)) {
                (Some(alias), None) => (*second, alias),
                (None, Some(alias)) => (*first, alias),
                _ => {
                    return Err(GrammarError::InvalidAliasPair {
                        token: error_token(),
                        offset,
                    });
                }
            };
            let mut descriptor = OptionDescriptor::named(name);
            descriptor.alias = Some(alias);
            Ok(descriptor)
        }
        _ => Err(GrammarError::TooManyParts {
            token: error_token(),
            offset,
        }),
    }
}

fn single_char(part: &str) -> Option<char> {
    let mut chars = part.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn check_duplicates(descriptors: &[OptionDescriptor]) -> Result<(), GrammarError> {
    let mut names = HashSet::new();
    let mut aliases = HashSet::new();
    for descriptor in descriptors {
        if !names.insert(descriptor.name.as_str()) {
            return Err(GrammarError::DuplicateName(descriptor.name.clone()));
        }
        if let Some(alias) = descriptor.alias
            && !aliases.insert(alias)
        {
            return Err(GrammarError::DuplicateAlias(alias));
        }
    }
    Ok(())
}

// MARK: --- UNIT TESTS ---
