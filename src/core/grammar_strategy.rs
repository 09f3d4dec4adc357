// src/core/grammar_strategy.rs

use crate::core::{
    action::Action,
    grammar,
    strategy::{CachingStrategy, DefinitionError, Scanner, Slot},
};

/// Name under which the grammar strategy is registered.
pub const GRAMMAR_STRATEGY: &str = "grammar";

/// Derives options from the action's one-line description, then binds each
/// declared name to the action's accessors.
///
/// For every name, a getter is preferred as reader and a setter as writer; a
/// same-named field fills in whichever side is missing.
#[derive(Debug, Default)]
pub struct GrammarScanner;

/// The strategy used for actions that carry an option description.
pub type GrammarStrategy = CachingStrategy<GrammarScanner>;

impl GrammarStrategy {
    pub fn grammar() -> Self {
        Self::new(GrammarScanner)
    }
}

impl Scanner for GrammarScanner {
    fn name(&self) -> &str {
        GRAMMAR_STRATEGY
    }

    fn accepts(&self, action: &dyn Action) -> bool {
        action.synopsis().is_some()
    }

    fn scan(&self, action: &dyn Action) -> Result<Vec<Slot>, DefinitionError> {
        let type_name = action.type_name();
        let synopsis = action
            .synopsis()
            .ok_or_else(|| DefinitionError::MissingSynopsis {
                action: type_name.to_string(),
            })?;
        let descriptors = grammar::parse(synopsis).map_err(|source| DefinitionError::Grammar {
            action: type_name.to_string(),
            source,
        })?;

        let accessors = action.accessors();
        descriptors
            .into_iter()
            .map(|mut descriptor| -> Result<Slot, DefinitionError> {
                let field = accessors.field(&descriptor.name);
                let reader = accessors
                    .getter(&descriptor.name)
                    .or(field.filter(|f| f.is_readable()))
                    .cloned();
                let writer = accessors
                    .setter(&descriptor.name)
                    .or(field.filter(|f| f.is_writable()))
                    .cloned();

                let typed = writer.as_ref().or(reader.as_ref()).ok_or_else(|| {
                    DefinitionError::NoAccessor {
                        action: type_name.to_string(),
                        option: descriptor.name.clone(),
                    }
                })?;
                descriptor.value_type = typed.value_type().clone();
                Ok(Slot {
                    descriptor,
                    reader,
                    writer,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        accessors::{Accessors, Marks},
        binding::BindError,
        converters::ConverterRegistry,
        strategy::DisassemblyStrategy,
    };
    use crate::models::{Value, ValueType};

    #[derive(Debug, Default)]
    struct Archive {
        file: String,
        level: i64,
        mode: String,
        quiet: bool,
    }

    impl Action for Archive {
        fn run(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn synopsis(&self) -> Option<&str> {
            Some("file [--level|l --mode --quiet|q]")
        }

        fn accessors(&self) -> Accessors {
            Accessors::of::<Self>()
                .field("file", |a| &a.file, |a| &mut a.file)
                .field("level", |a| &a.level, |a| &mut a.level)
                .field("mode", |a| &a.mode, |a| &mut a.mode)
                .setter("mode", |a, mode: String| a.mode = mode.to_uppercase())
                .getter("quiet", |a| a.quiet)
                .build()
        }
    }

    #[derive(Debug, Default)]
    struct Unbound;

    impl Action for Unbound {
        fn run(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn synopsis(&self) -> Option<&str> {
            Some("--ghost")
        }
    }

    #[derive(Debug, Default)]
    struct Malformed {
        items: Vec<String>,
    }

    impl Action for Malformed {
        fn run(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn synopsis(&self) -> Option<&str> {
            Some("items [items]")
        }

        fn accessors(&self) -> Accessors {
            Accessors::of::<Self>()
                .option("items", Marks::new(), |m| &m.items, |m| &mut m.items)
                .build()
        }
    }

    #[test]
    fn test_descriptors_take_accessor_types() {
        let strategy = GrammarStrategy::grammar();
        let options = strategy.options(&Archive::default()).unwrap();
        let summary: Vec<_> = options
            .iter()
            .map(|o| (o.name.as_str(), o.value_type.clone(), o.required))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("file", ValueType::Text, true),
                ("level", ValueType::Integer, false),
                ("mode", ValueType::Text, false),
                ("quiet", ValueType::Bool, false),
            ]
        );
        assert_eq!(options[3].default_value, Some(Value::Bool(false)));
    }

    #[test]
    fn test_setter_is_preferred_over_field() {
        let strategy = GrammarStrategy::grammar();
        let mut archive = Archive::default();
        strategy
            .set_option_by_name(&mut archive, "mode", "fast", &ConverterRegistry::default())
            .unwrap();
        assert_eq!(archive.mode, "FAST");
    }

    #[test]
    fn test_getter_only_option_is_read_only() {
        let strategy = GrammarStrategy::grammar();
        let mut archive = Archive::default();
        let err = strategy
            .set_option_by_alias(&mut archive, 'q', "true", &ConverterRegistry::default())
            .unwrap_err();
        assert!(matches!(err, BindError::ReadOnly(_)));
    }

    #[test]
    fn test_missing_accessors_is_a_definition_error() {
        let strategy = GrammarStrategy::grammar();
        assert!(matches!(
            strategy.options(&Unbound),
            Err(DefinitionError::NoAccessor { .. })
        ));
    }

    #[test]
    fn test_duplicate_declaration_is_a_grammar_error() {
        let strategy = GrammarStrategy::grammar();
        assert!(matches!(
            strategy.options(&Malformed::default()),
            Err(DefinitionError::Grammar { .. })
        ));
    }
}
