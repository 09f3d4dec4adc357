// src/core/strategy.rs

//! # Disassembly Strategies
//!
//! A strategy maps an action onto its option descriptors and reads or writes
//! option values on it. The registry picks one strategy per action at
//! registration time; the binding then only talks to the action through it.
//!
//! The two built-in strategies share [`CachingStrategy`], which describes each
//! action type once, validates the result, captures default values from the
//! first instance it inspects, and serves every later request from a per-type
//! cache. A concrete strategy only supplies a [`Scanner`].

use crate::{
    core::{
        accessors::{AccessError, Member},
        action::Action,
        binding::{BindError, OptionKey},
        converters::ConverterRegistry,
        grammar::GrammarError,
    },
    models::{OptionDescriptor, Value},
};
use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};
use thiserror::Error;

/// Raised when an action's options cannot be described. Fatal at registration time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Invalid option description for '{action}': {source}")]
    Grammar {
        action: String,
        #[source]
        source: GrammarError,
    },
    #[error("'{action}' has no option description.")]
    MissingSynopsis { action: String },
    #[error("Option '{option}' of '{action}' has neither a reader nor a writer.")]
    NoAccessor { action: String, option: String },
    #[error("Option '{option}' is declared more than once in '{action}'.")]
    DuplicateName { action: String, option: String },
    #[error("Alias '-{alias}' is declared more than once in '{action}'.")]
    DuplicateAlias { action: String, alias: char },
    #[error("Positional options of '{action}' must be numbered from 0 without gaps (found {indices:?}).")]
    IndexGap { action: String, indices: Vec<usize> },
    #[error("Could not read the default of option '{option}' in '{action}': {source}")]
    Default {
        action: String,
        option: String,
        #[source]
        source: AccessError,
    },
}

/// The invocable unit handed back by a strategy.
pub type Executable<'a> = Box<dyn FnOnce() -> anyhow::Result<()> + 'a>;

/// Maps an action to its option descriptors and performs typed get/set of its values.
pub trait DisassemblyStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Whether this strategy can disassemble `action`.
    fn accepts(&self, action: &dyn Action) -> bool;

    /// The action's option descriptors, in declaration order.
    fn options(&self, action: &dyn Action) -> Result<Arc<[OptionDescriptor]>, DefinitionError>;

    fn get_value(
        &self,
        action: &dyn Action,
        option: &OptionDescriptor,
    ) -> Result<Option<Value>, BindError>;

    /// Converts `raw` according to the option's value type and stores it on the action.
    fn set_value(
        &self,
        action: &mut dyn Action,
        option: &OptionDescriptor,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<(), BindError>;

    /// Restores every option of the action to its captured default.
    fn reset(&self, action: &mut dyn Action) -> Result<(), BindError>;

    fn is_default(&self, action: &dyn Action) -> bool {
        action.markers().default
    }

    fn is_internal(&self, action: &dyn Action) -> bool {
        action.markers().internal
    }

    fn executable<'a>(&self, action: &'a mut dyn Action) -> Executable<'a> {
        Box::new(move || action.run())
    }

    fn set_option_by_name(
        &self,
        action: &mut dyn Action,
        name: &str,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<OptionDescriptor, BindError> {
        let option = find_option(self.options(action)?, &OptionKey::Name(name.to_string()))?;
        self.set_value(action, &option, raw, converters)?;
        Ok(option)
    }

    fn set_option_by_alias(
        &self,
        action: &mut dyn Action,
        alias: char,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<OptionDescriptor, BindError> {
        let option = find_option(self.options(action)?, &OptionKey::Alias(alias))?;
        self.set_value(action, &option, raw, converters)?;
        Ok(option)
    }

    fn set_option_by_index(
        &self,
        action: &mut dyn Action,
        index: usize,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<OptionDescriptor, BindError> {
        let option = find_option(self.options(action)?, &OptionKey::Index(index))?;
        self.set_value(action, &option, raw, converters)?;
        Ok(option)
    }
}

fn find_option(
    options: Arc<[OptionDescriptor]>,
    key: &OptionKey,
) -> Result<OptionDescriptor, BindError> {
    options
        .iter()
        .find(|option| key.matches(option))
        .cloned()
        .ok_or_else(|| BindError::NoSuchOption(key.clone()))
}

// --- CACHING BASE ---

/// One described option together with the members used to read and write it.
#[derive(Debug, Clone)]
pub struct Slot {
    pub descriptor: OptionDescriptor,
    pub reader: Option<Member>,
    pub writer: Option<Member>,
}

/// The cached description of one action type.
#[derive(Debug)]
pub struct Described {
    slots: Vec<Slot>,
    descriptors: Arc<[OptionDescriptor]>,
}

impl Described {
    fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.descriptor.name == name)
    }
}

type DescribeCell = Arc<OnceLock<Result<Arc<Described>, DefinitionError>>>;

/// Read-through cache of descriptions, keyed by action type.
///
/// Concurrent first reads of the same type wait on a single computation.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    cells: RwLock<HashMap<TypeId, DescribeCell>>,
}

impl DescriptorCache {
    pub fn get_or_describe<F>(&self, key: TypeId, describe: F) -> Result<Arc<Described>, DefinitionError>
    where
        F: FnOnce() -> Result<Described, DefinitionError>,
    {
        let existing = self
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        let cell = match existing {
            Some(cell) => cell,
            None => self
                .cells
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default()
                .clone(),
        };
        cell.get_or_init(|| describe().map(Arc::new)).clone()
    }

    /// Number of action types described so far.
    pub fn len(&self) -> usize {
        self.cells.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces the raw slots of an action. Validation and default capture are
/// done by [`CachingStrategy`].
pub trait Scanner: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn accepts(&self, action: &dyn Action) -> bool;
    fn scan(&self, action: &dyn Action) -> Result<Vec<Slot>, DefinitionError>;
}

/// A strategy that describes each action type once and caches the result.
#[derive(Debug, Default)]
pub struct CachingStrategy<S> {
    scanner: S,
    cache: DescriptorCache,
}

impl<S: Scanner> CachingStrategy<S> {
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            cache: DescriptorCache::default(),
        }
    }

    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    fn described(&self, action: &dyn Action) -> Result<Arc<Described>, DefinitionError> {
        let key = action.as_any().type_id();
        self.cache.get_or_describe(key, || {
            log::debug!(
                "Describing '{}' with the '{}' strategy",
                action.type_name(),
                self.scanner.name()
            );
            let mut slots = self.scanner.scan(action)?;
            validate(action.type_name(), &slots)?;
            capture_defaults(action, &mut slots)?;
            let descriptors = slots.iter().map(|slot| slot.descriptor.clone()).collect();
            Ok(Described { slots, descriptors })
        })
    }

    fn slot<'d>(described: &'d Described, option: &OptionDescriptor) -> Result<&'d Slot, BindError> {
        described
            .slot(&option.name)
            .ok_or_else(|| BindError::NoSuchOption(OptionKey::Name(option.name.clone())))
    }
}

fn validate(action: &str, slots: &[Slot]) -> Result<(), DefinitionError> {
    let mut names = HashSet::new();
    let mut aliases = HashSet::new();
    let mut indices = Vec::new();

    for descriptor in slots.iter().map(|slot| &slot.descriptor) {
        if !names.insert(descriptor.name.as_str()) {
            return Err(DefinitionError::DuplicateName {
                action: action.to_string(),
                option: descriptor.name.clone(),
            });
        }
        if let Some(alias) = descriptor.alias
            && !aliases.insert(alias)
        {
            return Err(DefinitionError::DuplicateAlias {
                action: action.to_string(),
                alias,
            });
        }
        if let Some(index) = descriptor.index {
            indices.push(index);
        }
    }

    indices.sort_unstable();
    if indices.iter().enumerate().any(|(expected, &index)| expected != index) {
        return Err(DefinitionError::IndexGap {
            action: action.to_string(),
            indices,
        });
    }
    Ok(())
}

/// Defaults are whatever the first inspected instance holds.
fn capture_defaults(action: &dyn Action, slots: &mut [Slot]) -> Result<(), DefinitionError> {
    for slot in slots.iter_mut() {
        let Some(reader) = &slot.reader else {
            continue;
        };
        slot.descriptor.default_value =
            reader
                .read(action.as_any())
                .map_err(|source| DefinitionError::Default {
                    action: action.type_name().to_string(),
                    option: slot.descriptor.name.clone(),
                    source,
                })?;
    }
    Ok(())
}

impl<S: Scanner> DisassemblyStrategy for CachingStrategy<S> {
    fn name(&self) -> &str {
        self.scanner.name()
    }

    fn accepts(&self, action: &dyn Action) -> bool {
        self.scanner.accepts(action)
    }

    fn options(&self, action: &dyn Action) -> Result<Arc<[OptionDescriptor]>, DefinitionError> {
        Ok(self.described(action)?.descriptors.clone())
    }

    fn get_value(
        &self,
        action: &dyn Action,
        option: &OptionDescriptor,
    ) -> Result<Option<Value>, BindError> {
        let described = self.described(action)?;
        let slot = Self::slot(&described, option)?;
        let reader = slot
            .reader
            .as_ref()
            .ok_or_else(|| BindError::WriteOnly(option.to_string()))?;
        reader
            .read(action.as_any())
            .map_err(|source| BindError::Access {
                option: option.to_string(),
                source,
            })
    }

    fn set_value(
        &self,
        action: &mut dyn Action,
        option: &OptionDescriptor,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<(), BindError> {
        let described = self.described(action)?;
        let slot = Self::slot(&described, option)?;
        let writer = slot
            .writer
            .as_ref()
            .ok_or_else(|| BindError::ReadOnly(option.to_string()))?;

        let value = converters
            .convert(&slot.descriptor.value_type, raw)
            .map_err(|source| BindError::Conversion {
                option: option.to_string(),
                raw: raw.to_string(),
                source,
            })?;
        log::debug!("Setting {} = {:?}", option, value);
        writer
            .write(action.as_any_mut(), Some(value))
            .map_err(|source| BindError::Access {
                option: option.to_string(),
                source,
            })?;
        Ok(())
    }

    fn reset(&self, action: &mut dyn Action) -> Result<(), BindError> {
        let described = self.described(action)?;
        for slot in &described.slots {
            // Options without a reader never had a default to restore.
            let (Some(_), Some(writer)) = (&slot.reader, &slot.writer) else {
                continue;
            };
            writer
                .write(action.as_any_mut(), slot.descriptor.default_value.clone())
                .map_err(|source| BindError::Access {
                    option: slot.descriptor.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
