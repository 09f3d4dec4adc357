// src/cli/dispatcher.rs

use crate::{
    constants::SHORT_PREFIX,
    core::registry::{ActionRegistry, DispatchError},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineError {
    #[error("Could not split command line (unbalanced quotes?): {0}")]
    Quoting(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Dispatches a full argument vector.
///
/// # Logic:
/// - Empty, or starting with an option: the default action gets every argument.
/// - Otherwise the first argument is the target and the rest are its arguments.
pub fn dispatch_args<S: AsRef<str>>(registry: &ActionRegistry, argv: &[S]) -> Result<(), DispatchError> {
    log::debug!("Dispatching {} argument(s)", argv.len());
    match argv.split_first() {
        Some((target, rest)) if !target.as_ref().starts_with(SHORT_PREFIX) => {
            registry.dispatch(target.as_ref(), rest)
        }
        _ => registry.dispatch_default(argv),
    }
}

/// Splits `line` the way a POSIX shell would, then dispatches it.
pub fn dispatch_line(registry: &ActionRegistry, line: &str) -> Result<(), LineError> {
    let argv = shlex::split(line).ok_or_else(|| LineError::Quoting(line.to_string()))?;
    dispatch_args(registry, &argv)?;
    Ok(())
}
