// src/cli/handlers/mod.rs

// Built-in actions shipped with the `actio` binary.

use crate::core::registry::{ActionRegistry, RegistryError};

pub mod count;
pub mod echo;
pub mod help;

/// Registers every built-in action. `help` goes last so its catalog sees the others.
pub fn register_builtins(registry: &ActionRegistry) -> Result<(), RegistryError> {
    registry.register("echo", echo::Echo::default())?;
    registry.register("count", count::Count::default())?;
    registry.register(help::Help::NAME, help::Help::from_registry(registry))?;
    Ok(())
}
