// src/core/binding.rs

use crate::{
    constants::{LONG_PREFIX, SHORT_PREFIX},
    core::{
        accessors::AccessError,
        action::Action,
        arg_parser::ParsedArgs,
        converters::ConverterRegistry,
        registry::DispatchError,
        strategy::{DefinitionError, DisassemblyStrategy},
    },
    models::{ConversionError, OptionDescriptor, Value},
};
use std::{collections::HashSet, fmt, sync::Arc};
use thiserror::Error;

/// How an option was addressed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKey {
    Name(String),
    Alias(char),
    Index(usize),
}

impl OptionKey {
    pub fn matches(&self, option: &OptionDescriptor) -> bool {
        match self {
            Self::Name(name) => option.name == *name,
            Self::Alias(alias) => option.alias == Some(*alias),
            Self::Index(index) => option.index == Some(*index),
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}{}", LONG_PREFIX, name),
            Self::Alias(alias) => write!(f, "{}{}", SHORT_PREFIX, alias),
            Self::Index(index) => write!(f, "positional argument #{}", index + 1),
        }
    }
}

#[derive(Error, Debug)]
pub enum BindError {
    #[error("No such option: {0}")]
    NoSuchOption(OptionKey),
    #[error("Invalid value '{raw}' for option {option}: {source}")]
    Conversion {
        option: String,
        raw: String,
        #[source]
        source: ConversionError,
    },
    #[error("Option {0} cannot be set.")]
    ReadOnly(String),
    #[error("Option {0} cannot be read.")]
    WriteOnly(String),
    #[error("Option {option} could not be accessed: {source}")]
    Access {
        option: String,
        #[source]
        source: AccessError,
    },
    #[error("Both {option} and its alias {alias} were provided.")]
    Conflict { option: String, alias: String },
    #[error("Required option(s) missing: {}", .0.join(", "))]
    RequiredMissing(Vec<String>),
    #[error("Action '{0}' must be reset before it can run again.")]
    NotArmed(String),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Lifecycle of a binding within one dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Created,
    Armed,
    Executed,
}

/// Couples a registered action with the strategy that disassembles it and
/// tracks which required options are still unset in the current cycle.
pub struct ActionBinding {
    name: String,
    action: Box<dyn Action>,
    strategy: Arc<dyn DisassemblyStrategy>,
    options: Arc<[OptionDescriptor]>,
    pending_required: HashSet<String>,
    state: BindingState,
    is_default: bool,
    is_internal: bool,
}

impl fmt::Debug for ActionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBinding")
            .field("name", &self.name)
            .field("action", &self.action.type_name())
            .field("strategy", &self.strategy.name())
            .field("options", &self.options)
            .field("pending_required", &self.pending_required)
            .field("state", &self.state)
            .finish()
    }
}

impl ActionBinding {
    /// Describes the action through `strategy`. Definition errors surface here,
    /// at registration time.
    pub fn new(
        name: impl Into<String>,
        action: Box<dyn Action>,
        strategy: Arc<dyn DisassemblyStrategy>,
    ) -> Result<Self, DefinitionError> {
        let options = strategy.options(&*action)?;
        let is_default = strategy.is_default(&*action);
        let is_internal = strategy.is_internal(&*action);
        Ok(Self {
            name: name.into(),
            action,
            strategy,
            options,
            pending_required: HashSet::new(),
            state: BindingState::Created,
            is_default,
            is_internal,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &[OptionDescriptor] {
        &self.options
    }

    pub fn strategy(&self) -> &Arc<dyn DisassemblyStrategy> {
        &self.strategy
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    /// Required options not yet set in this cycle, in declaration order.
    pub fn pending_required(&self) -> Vec<&OptionDescriptor> {
        self.options
            .iter()
            .filter(|option| self.pending_required.contains(&option.name))
            .collect()
    }

    /// Restores every option to its default and re-arms the required set.
    pub fn reset(&mut self) -> Result<(), BindError> {
        self.strategy.reset(&mut *self.action)?;
        self.pending_required = self
            .options
            .iter()
            .filter(|option| option.required)
            .map(|option| option.name.clone())
            .collect();
        self.state = BindingState::Armed;
        log::debug!(
            "Armed '{}' with {} required option(s)",
            self.name,
            self.pending_required.len()
        );
        Ok(())
    }

    fn mark_set(&mut self, option: &OptionDescriptor) {
        self.pending_required.remove(&option.name);
    }

    pub fn set_option(
        &mut self,
        name: &str,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<(), BindError> {
        let option = self
            .strategy
            .set_option_by_name(&mut *self.action, name, raw, converters)?;
        self.mark_set(&option);
        Ok(())
    }

    pub fn set_alias(
        &mut self,
        alias: char,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<(), BindError> {
        let option = self
            .strategy
            .set_option_by_alias(&mut *self.action, alias, raw, converters)?;
        self.mark_set(&option);
        Ok(())
    }

    pub fn set_positional(
        &mut self,
        index: usize,
        raw: &str,
        converters: &ConverterRegistry,
    ) -> Result<(), BindError> {
        let option = self
            .strategy
            .set_option_by_index(&mut *self.action, index, raw, converters)?;
        self.mark_set(&option);
        Ok(())
    }

    pub fn get_value(&self, name: &str) -> Result<Option<Value>, BindError> {
        let key = OptionKey::Name(name.to_string());
        let option = self
            .options
            .iter()
            .find(|option| key.matches(option))
            .ok_or(BindError::NoSuchOption(key))?;
        self.strategy.get_value(&*self.action, option)
    }

    /// Applies parsed arguments: named values, then aliases, then positionals.
    ///
    /// Names and aliases are applied in sorted order so a failing invocation
    /// always reports the same option.
    pub fn bind(&mut self, args: &ParsedArgs, converters: &ConverterRegistry) -> Result<(), BindError> {
        for option in self.options.iter() {
            if let Some(alias) = option.alias
                && args.named().contains_key(&option.name)
                && args.aliased().contains_key(&alias)
            {
                return Err(BindError::Conflict {
                    option: OptionKey::Name(option.name.clone()).to_string(),
                    alias: OptionKey::Alias(alias).to_string(),
                });
            }
        }

        let mut named: Vec<_> = args.named().iter().collect();
        named.sort();
        for (name, raw) in named {
            self.set_option(name, raw, converters)?;
        }

        let mut aliased: Vec<_> = args.aliased().iter().collect();
        aliased.sort();
        for (alias, raw) in aliased {
            self.set_alias(*alias, raw, converters)?;
        }

        for (index, raw) in args.positional().iter().enumerate() {
            self.set_positional(index, raw, converters)?;
        }
        Ok(())
    }

    /// Runs the action once. Only allowed on an armed binding with no
    /// required option left unset.
    pub fn execute(&mut self) -> Result<(), DispatchError> {
        if self.state != BindingState::Armed {
            return Err(BindError::NotArmed(self.name.clone()).into());
        }
        let missing: Vec<String> = self
            .pending_required()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(BindError::RequiredMissing(missing).into());
        }

        self.state = BindingState::Executed;
        log::debug!("Executing '{}'", self.name);
        let unit = self.strategy.executable(&mut *self.action);
        unit().map_err(|source| DispatchError::Execution {
            action: self.name.clone(),
            source,
        })
    }

    /// One full cycle: reset, bind, execute.
    pub fn dispatch(&mut self, args: &ParsedArgs, converters: &ConverterRegistry) -> Result<(), DispatchError> {
        self.reset()?;
        self.bind(args, converters)?;
        self.execute()
    }
}
