// src/core/member_strategy.rs

use crate::{
    constants::DEFAULT_STRATEGY,
    core::{
        accessors::MemberKind,
        action::Action,
        strategy::{CachingStrategy, DefinitionError, Scanner, Slot},
    },
    models::OptionDescriptor,
};

/// Derives options from the fields an action marks in its accessor table.
///
/// Own fields come first, then embedded base fields, in declaration order.
/// The option takes the field's name; alias, index and required flag come
/// from the field's [`Marks`](crate::core::accessors::Marks).
#[derive(Debug, Default)]
pub struct MemberScanner;

/// The strategy used for actions that do not carry an option description.
pub type MemberStrategy = CachingStrategy<MemberScanner>;

impl MemberStrategy {
    pub fn members() -> Self {
        Self::new(MemberScanner)
    }
}

impl Scanner for MemberScanner {
    fn name(&self) -> &str {
        DEFAULT_STRATEGY
    }

    /// Anything not routed to the grammar strategy.
    fn accepts(&self, action: &dyn Action) -> bool {
        action.synopsis().is_none()
    }

    fn scan(&self, action: &dyn Action) -> Result<Vec<Slot>, DefinitionError> {
        let accessors = action.accessors();
        let slots = accessors
            .members()
            .iter()
            .filter(|member| member.kind() == MemberKind::Field)
            .filter_map(|member| {
                let marks = member.marks()?;
                let descriptor = OptionDescriptor {
                    name: member.name().to_string(),
                    alias: marks.alias,
                    index: marks.index,
                    required: marks.required,
                    value_type: member.value_type().clone(),
                    default_value: None,
                };
                Some(Slot {
                    descriptor,
                    reader: Some(member.clone()),
                    writer: Some(member.clone()),
                })
            })
            .collect();
        Ok(slots)
    }
}
