// src/core/registry.rs

//! # Action Registry
//!
//! Holds every registered action under its name, the strategies available to
//! disassemble them, and the converters used while binding. Registration is
//! fail-fast: any error leaves the registry unchanged. Dispatch runs one full
//! reset, bind and execute cycle on the calling thread.

use crate::{
    core::{
        action::Action,
        arg_parser::{ParsedArgs, TokenizeError},
        binding::{ActionBinding, BindError},
        config_loader::EngineConfig,
        converters::ConverterRegistry,
        grammar_strategy::GrammarStrategy,
        member_strategy::MemberStrategy,
        strategy::{DefinitionError, DisassemblyStrategy},
        target_resolver::{self, Resolution, TargetError},
    },
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Action names must not be empty.")]
    EmptyName,
    #[error("An action named '{0}' is already registered.")]
    DuplicateName(String),
    #[error("A strategy named '{0}' is already registered.")]
    DuplicateStrategy(String),
    #[error("Action '{action}' asks for strategy '{strategy}', which is not registered.")]
    UnknownStrategy { action: String, strategy: String },
    #[error("Strategy '{strategy}' refuses action '{action}'.")]
    StrategyRefused { action: String, strategy: String },
    #[error("No strategy accepts action '{action}' (refused by: {}).", .refused.join(", "))]
    NoStrategy { action: String, refused: Vec<String> },
    #[error("Action '{0}' cannot be both the default and internal.")]
    DefaultAndInternal(String),
    #[error("Action '{action}' is marked default, but '{existing}' already is.")]
    SecondDefault { action: String, existing: String },
    #[error("Cannot register '{action}': {source}")]
    Definition {
        action: String,
        #[source]
        source: DefinitionError,
    },
}

/// Everything that can abort a single dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("Action '{action}' failed: {source}")]
    Execution {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug)]
struct RegistryEntry {
    binding: Arc<Mutex<ActionBinding>>,
    default: bool,
    internal: bool,
}

#[derive(Debug)]
pub struct ActionRegistry {
    config: EngineConfig,
    strategies: RwLock<Vec<Arc<dyn DisassemblyStrategy>>>,
    actions: RwLock<HashMap<String, RegistryEntry>>,
    converters: ConverterRegistry,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ActionRegistry {
    /// Creates a registry with the member and grammar strategies installed, in that order.
    pub fn new(config: EngineConfig) -> Self {
        let strategies: Vec<Arc<dyn DisassemblyStrategy>> = vec![
            Arc::new(MemberStrategy::members()),
            Arc::new(GrammarStrategy::grammar()),
        ];
        Self {
            config,
            strategies: RwLock::new(strategies),
            actions: RwLock::new(HashMap::new()),
            converters: ConverterRegistry::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Appends a strategy. Strategies are consulted in the order they were added.
    pub fn add_strategy(&self, strategy: Arc<dyn DisassemblyStrategy>) -> Result<(), RegistryError> {
        let mut strategies = self.strategies.write().unwrap_or_else(PoisonError::into_inner);
        if strategies.iter().any(|known| known.name() == strategy.name()) {
            return Err(RegistryError::DuplicateStrategy(strategy.name().to_string()));
        }
        log::debug!("Added strategy '{}'", strategy.name());
        strategies.push(strategy);
        Ok(())
    }

    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|strategy| strategy.name().to_string())
            .collect()
    }

    /// Picks the strategy for `action`.
    ///
    /// # Order:
    /// 1. The action's own strategy.
    /// 2. The strategy named by the action's markers. It must exist and accept the action.
    /// 3. The configured default strategy, then every other strategy in
    ///    registration order. The first one that accepts wins.
    fn choose_strategy(&self, name: &str, action: &dyn Action) -> Result<Arc<dyn DisassemblyStrategy>, RegistryError> {
        if let Some(own) = action.strategy() {
            log::debug!("'{}' brings its own strategy '{}'", name, own.name());
            return Ok(own);
        }

        let strategies = self.strategies.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(wanted) = action.markers().strategy {
            let strategy = strategies
                .iter()
                .find(|strategy| strategy.name() == wanted)
                .ok_or_else(|| RegistryError::UnknownStrategy {
                    action: name.to_string(),
                    strategy: wanted.clone(),
                })?;
            if !strategy.accepts(action) {
                return Err(RegistryError::StrategyRefused {
                    action: name.to_string(),
                    strategy: wanted,
                });
            }
            return Ok(Arc::clone(strategy));
        }

        let preferred = self.config.default_strategy.as_str();
        let ordered = strategies
            .iter()
            .filter(|strategy| strategy.name() == preferred)
            .chain(strategies.iter().filter(|strategy| strategy.name() != preferred));

        let mut refused = Vec::new();
        for strategy in ordered {
            if strategy.accepts(action) {
                log::debug!("Strategy '{}' accepted '{}'", strategy.name(), name);
                return Ok(Arc::clone(strategy));
            }
            refused.push(strategy.name().to_string());
        }
        Err(RegistryError::NoStrategy {
            action: name.to_string(),
            refused,
        })
    }

    /// Registers `action` under `name`. Nothing is stored when an error is returned.
    pub fn register<A: Action + 'static>(&self, name: &str, action: A) -> Result<(), RegistryError> {
        self.register_boxed(name, Box::new(action))
    }

    pub fn register_boxed(&self, name: &str, action: Box<dyn Action>) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let strategy = self.choose_strategy(name, &*action)?;
        let binding = ActionBinding::new(name, action, strategy).map_err(|source| RegistryError::Definition {
            action: name.to_string(),
            source,
        })?;
        let (default, internal) = (binding.is_default(), binding.is_internal());
        if default && internal {
            return Err(RegistryError::DefaultAndInternal(name.to_string()));
        }

        let mut actions = self.actions.write().unwrap_or_else(PoisonError::into_inner);
        if actions.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        if default
            && let Some((existing, _)) = actions.iter().find(|(_, entry)| entry.default)
        {
            return Err(RegistryError::SecondDefault {
                action: name.to_string(),
                existing: existing.clone(),
            });
        }

        log::info!(
            "Registered action '{}' ({} option(s), strategy '{}'{}{})",
            name,
            binding.options().len(),
            binding.strategy().name(),
            if default { ", default" } else { "" },
            if internal { ", internal" } else { "" },
        );
        actions.insert(
            name.to_string(),
            RegistryEntry {
                binding: Arc::new(Mutex::new(binding)),
                default,
                internal,
            },
        );
        Ok(())
    }

    /// Names a user can invoke, sorted. Internal actions are left out.
    pub fn names(&self) -> Vec<String> {
        let actions = self.actions.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = actions
            .iter()
            .filter(|(_, entry)| !entry.internal)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact lookup by name, internal actions included.
    pub fn lookup(&self, name: &str) -> Option<Arc<Mutex<ActionBinding>>> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| Arc::clone(&entry.binding))
    }

    pub fn default_action(&self) -> Option<(String, Arc<Mutex<ActionBinding>>)> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(_, entry)| entry.default)
            .map(|(name, entry)| (name.clone(), Arc::clone(&entry.binding)))
    }

    /// Resolves a user-supplied target to an invocable action.
    ///
    /// When typo correction is enabled, a close enough name is substituted
    /// (with a warning) and a farther one is reported as a suggestion.
    pub fn resolve(&self, target: &str) -> Result<Arc<Mutex<ActionBinding>>, TargetError> {
        {
            let actions = self.actions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = actions.get(target)
                && !entry.internal
            {
                return Ok(Arc::clone(&entry.binding));
            }
        }

        if !self.config.typo.enabled {
            return Err(TargetError::Unknown(target.to_string()));
        }

        let names = self.names();
        let resolution = target_resolver::resolve(
            target,
            names.iter().map(String::as_str),
            self.config.typo.threshold,
        );
        if let Resolution::Substitute { name, distance } = &resolution {
            log::warn!(
                "Unknown action '{}', running '{}' instead (distance {:.2})",
                target,
                name,
                distance
            );
        }
        let name = resolution.into_target(target)?;
        self.lookup(&name)
            .ok_or_else(|| TargetError::Unknown(target.to_string()))
    }

    /// Runs the action named `target` with the raw arguments `argv`.
    pub fn dispatch<S: AsRef<str>>(&self, target: &str, argv: &[S]) -> Result<(), DispatchError> {
        let args = ParsedArgs::parse(argv)?;
        let binding = self.resolve(target)?;
        Self::run_binding(&binding, &args, &self.converters)
    }

    /// Runs the default action with the raw arguments `argv`.
    pub fn dispatch_default<S: AsRef<str>>(&self, argv: &[S]) -> Result<(), DispatchError> {
        let args = ParsedArgs::parse(argv)?;
        let (_, binding) = self.default_action().ok_or(TargetError::NoDefault)?;
        Self::run_binding(&binding, &args, &self.converters)
    }

    fn run_binding(
        binding: &Mutex<ActionBinding>,
        args: &ParsedArgs,
        converters: &ConverterRegistry,
    ) -> Result<(), DispatchError> {
        let mut binding = binding.lock().unwrap_or_else(PoisonError::into_inner);
        log::debug!("Dispatching '{}' with {} argument(s)", binding.name(), args.token_count());
        binding.dispatch(args, converters)
    }
}

// MARK: --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{
            accessors::{Accessors, Marks},
            config_loader::TypoConfig,
            grammar_strategy::GRAMMAR_STRATEGY,
        },
        models::{ActionMarkers, ConversionError, Value, ValueType},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every run so tests can see which action was dispatched.
    #[derive(Debug, Default)]
    struct Recorder {
        label: String,
        count: i64,
        markers: ActionMarkers,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(log: &Arc<Mutex<Vec<String>>>, markers: ActionMarkers) -> Self {
            Self {
                markers,
                log: Arc::clone(log),
                ..Self::default()
            }
        }
    }

    impl Action for Recorder {
        fn run(&mut self) -> anyhow::Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, self.count));
            Ok(())
        }

        fn accessors(&self) -> Accessors {
            Accessors::of::<Self>()
                .option("label", Marks::new().index(0), |r| &r.label, |r| &mut r.label)
                .option("count", Marks::new().alias('c'), |r| &r.count, |r| &mut r.count)
                .build()
        }

        fn markers(&self) -> ActionMarkers {
            self.markers.clone()
        }
    }

    /// Described through its synopsis.
    #[derive(Debug, Default)]
    struct Greet {
        who: String,
        runs: Arc<AtomicUsize>,
    }

    impl Action for Greet {
        fn run(&mut self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn accessors(&self) -> Accessors {
            Accessors::of::<Self>()
                .field("who", |g| &g.who, |g| &mut g.who)
                .build()
        }

        fn synopsis(&self) -> Option<&str> {
            Some("who")
        }
    }

    fn new_log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn registry_with(names: &[&str], log: &Arc<Mutex<Vec<String>>>) -> ActionRegistry {
        let registry = ActionRegistry::default();
        for name in names {
            registry
                .register(name, Recorder::new(log, ActionMarkers::default()))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_dispatch_binds_and_runs() {
        let log = new_log();
        let registry = registry_with(&["list"], &log);
        registry.dispatch("list", &["all", "-c", "3"]).unwrap();
        registry.dispatch("list", &["some"]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["all:3", "some:0"]);
    }

    #[test]
    fn test_strategy_selection() {
        let registry = ActionRegistry::default();
        let runs = Arc::new(AtomicUsize::new(0));
        registry
            .register(
                "greet",
                Greet {
                    runs: Arc::clone(&runs),
                    ..Greet::default()
                },
            )
            .unwrap();
        registry.register("rec", Recorder::default()).unwrap();

        let greet = registry.lookup("greet").unwrap();
        assert_eq!(greet.lock().unwrap().strategy().name(), GRAMMAR_STRATEGY);
        let rec = registry.lookup("rec").unwrap();
        assert_eq!(rec.lock().unwrap().strategy().name(), "members");

        registry.dispatch("greet", &["world"]).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(
            greet.lock().unwrap().get_value("who").unwrap(),
            Some(Value::Text("world".to_string()))
        );
    }

    #[test]
    fn test_named_strategy_must_exist_and_accept() {
        let registry = ActionRegistry::default();
        let unknown = Recorder {
            markers: ActionMarkers::default().with_strategy("reflection"),
            ..Recorder::default()
        };
        assert!(matches!(
            registry.register("a", unknown),
            Err(RegistryError::UnknownStrategy { .. })
        ));

        let refused = Recorder {
            markers: ActionMarkers::default().with_strategy(GRAMMAR_STRATEGY),
            ..Recorder::default()
        };
        assert!(matches!(
            registry.register("b", refused),
            Err(RegistryError::StrategyRefused { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_no_accepting_strategy_lists_refusals() {
        #[derive(Debug)]
        struct Picky;
        impl crate::core::strategy::Scanner for Picky {
            fn name(&self) -> &str {
                "picky"
            }
            fn accepts(&self, _action: &dyn Action) -> bool {
                false
            }
            fn scan(&self, _action: &dyn Action) -> Result<Vec<crate::core::strategy::Slot>, DefinitionError> {
                Ok(Vec::new())
            }
        }

        let registry = ActionRegistry::new(EngineConfig {
            default_strategy: "picky".to_string(),
            ..EngineConfig::default()
        });
        registry
            .add_strategy(Arc::new(crate::core::strategy::CachingStrategy::new(Picky)))
            .unwrap();
        assert!(matches!(
            registry.add_strategy(Arc::new(MemberStrategy::members())),
            Err(RegistryError::DuplicateStrategy(_))
        ));

        // Greet is refused by "picky" and "members", then accepted by "grammar".
        registry.register("greet", Greet::default()).unwrap();

        registry.strategies.write().unwrap().retain(|strategy| strategy.name() == "picky");
        let err = registry.register("other", Greet::default()).unwrap_err();
        assert!(matches!(err, RegistryError::NoStrategy { ref refused, .. } if refused == &["picky"]));
        assert_eq!(registry.names(), ["greet"]);
    }

    #[test]
    fn test_default_and_internal_rules() {
        let log = new_log();
        let registry = ActionRegistry::default();
        registry
            .register("help", Recorder::new(&log, ActionMarkers::default_action()))
            .unwrap();

        let err = registry
            .register("usage", Recorder::new(&log, ActionMarkers::default_action()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::SecondDefault { ref existing, .. } if existing == "help"));

        let both = ActionMarkers {
            default: true,
            internal: true,
            strategy: None,
        };
        assert!(matches!(
            registry.register("odd", Recorder::new(&log, both)),
            Err(RegistryError::DefaultAndInternal(_))
        ));

        assert!(matches!(
            registry.register("help", Recorder::default()),
            Err(RegistryError::DuplicateName(_))
        ));
        assert!(matches!(registry.register(" ", Recorder::default()), Err(RegistryError::EmptyName)));
        assert_eq!(registry.names(), ["help"]);

        registry.dispatch_default(&["x"]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["x:0"]);
    }

    #[test]
    fn test_no_default_registered() {
        let registry = ActionRegistry::default();
        let err = registry.dispatch_default::<&str>(&[]).unwrap_err();
        assert!(matches!(err, DispatchError::Target(TargetError::NoDefault)));
    }

    #[test]
    fn test_internal_actions_are_not_invocable() {
        let log = new_log();
        let registry = ActionRegistry::default();
        registry
            .register("sync-index", Recorder::new(&log, ActionMarkers::internal()))
            .unwrap();
        assert!(registry.names().is_empty());
        assert!(registry.lookup("sync-index").is_some());
        assert!(matches!(
            registry.resolve("sync-index"),
            Err(TargetError::Unknown(_))
        ));
    }

    #[test]
    fn test_typo_substitution_and_suggestion() {
        let log = new_log();
        let registry = ActionRegistry::new(EngineConfig {
            typo: TypoConfig {
                enabled: true,
                threshold: 0.6,
            },
            ..EngineConfig::default()
        });
        for name in ["help", "read", "list"] {
            registry
                .register(name, Recorder::new(&log, ActionMarkers::default()))
                .unwrap();
        }
        registry.dispatch("lsit", &["typo"]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["typo:0"]);
        assert!(matches!(
            registry.resolve("zzzz"),
            Err(TargetError::Unknown(_))
        ));

        let strict = registry_with(&["help", "read", "list"], &log);
        let err = strict.dispatch("lsit", &["typo"]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown action 'lsit'. Did you mean 'list'?");
    }

    #[test]
    fn test_typo_correction_can_be_disabled() {
        let log = new_log();
        let registry = ActionRegistry::new(EngineConfig {
            typo: TypoConfig {
                enabled: false,
                threshold: 0.6,
            },
            ..EngineConfig::default()
        });
        registry
            .register("list", Recorder::new(&log, ActionMarkers::default()))
            .unwrap();
        assert!(matches!(registry.resolve("lsit"), Err(TargetError::Unknown(_))));
    }

    #[test]
    fn test_custom_converter_is_used_while_binding() {
        let registry = ActionRegistry::default();
        registry
            .converters()
            .register(ValueType::Text, |raw: &str| -> Result<Value, ConversionError> {
                Ok(Value::Text(raw.to_uppercase()))
            });
        let log = new_log();
        registry
            .register("rec", Recorder::new(&log, ActionMarkers::default()))
            .unwrap();
        registry.dispatch("rec", &["loud"]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["LOUD:0"]);
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(ActionRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(&format!("task-{i}"), Recorder::default()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(registry.len(), 8);
    }
}
