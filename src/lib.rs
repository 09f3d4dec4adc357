//! A declarative command-line dispatch engine.
//!
//! Actions describe their options either through marked fields or through a
//! one-line option description. The [`ActionRegistry`] picks a strategy for
//! each action, binds parsed arguments onto it and runs it once per dispatch.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;

pub use crate::core::{
    accessors::{Accessors, Marks},
    action::Action,
    binding::{ActionBinding, BindError},
    config_loader::EngineConfig,
    registry::{ActionRegistry, DispatchError, RegistryError},
};
pub use crate::models::{ActionMarkers, OptionDescriptor, Value, ValueType};
