// src/core/action.rs

use crate::{
    core::{accessors::Accessors, strategy::DisassemblyStrategy},
    models::ActionMarkers,
};
use std::any::Any;
use std::sync::Arc;

/// Upcasting helper so strategies can reach the concrete type behind a `dyn Action`.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A named, invocable unit of work.
///
/// An action describes its options in one of two ways:
/// - by marking fields in the table returned from [`Action::accessors`], which
///   the member strategy turns into options; or
/// - by returning an option description from [`Action::synopsis`], which the
///   grammar strategy parses and then binds through the same accessor table.
///
/// Only `run` is mandatory. An action with neither marked fields nor a
/// synopsis simply takes no options.
pub trait Action: AsAny + Send {
    /// The body of the action. Runs once per dispatch, after every option was bound.
    fn run(&mut self) -> anyhow::Result<()>;

    fn accessors(&self) -> Accessors {
        Accessors::empty::<Self>()
    }

    /// One-line option description, see [`crate::core::grammar`].
    fn synopsis(&self) -> Option<&str> {
        None
    }

    fn markers(&self) -> ActionMarkers {
        ActionMarkers::default()
    }

    /// A strategy that must be used for this action, bypassing selection.
    fn strategy(&self) -> Option<Arc<dyn DisassemblyStrategy>> {
        None
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
