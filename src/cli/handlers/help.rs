// src/cli/handlers/help.rs

use crate::{
    core::{
        accessors::{Accessors, Marks},
        action::Action,
        registry::ActionRegistry,
    },
    models::{ActionMarkers, OptionDescriptor},
};
use anyhow::{Result, anyhow};
use colored::*;
use std::{fmt::Write as _, sync::PoisonError};

/// One invocable action and its rendered options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub options: Vec<String>,
}

/// The default action: lists every action, or the options of one.
#[derive(Debug, Default)]
pub struct Help {
    topic: Option<String>,
    catalog: Vec<CatalogEntry>,
}

impl Help {
    /// The name `register_builtins` gives this action.
    pub const NAME: &'static str = "help";

    /// Snapshots the invocable actions registered so far, plus help itself,
    /// which is not registered yet while its catalog is built.
    pub fn from_registry(registry: &ActionRegistry) -> Self {
        let mut catalog: Vec<CatalogEntry> = registry
            .names()
            .into_iter()
            .filter_map(|name| {
                let binding = registry.lookup(&name)?;
                let binding = binding.lock().unwrap_or_else(PoisonError::into_inner);
                let options = binding.options().iter().map(ToString::to_string).collect();
                Some(CatalogEntry { name, options })
            })
            .collect();
        if !catalog.iter().any(|entry| entry.name == Self::NAME) {
            catalog.push(CatalogEntry {
                name: Self::NAME.to_string(),
                options: vec![OptionDescriptor::positional("topic", 0).to_string()],
            });
            catalog.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Self {
            topic: None,
            catalog,
        }
    }

    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        match &self.topic {
            Some(topic) => {
                let entry = self
                    .catalog
                    .iter()
                    .find(|entry| entry.name == *topic)
                    .ok_or_else(|| anyhow!("No help available for '{}'.", topic))?;
                writeln!(out, "{} {}", "Usage:".yellow().bold(), entry.name.cyan())?;
                if entry.options.is_empty() {
                    writeln!(out, "  (no options)")?;
                }
                for option in &entry.options {
                    writeln!(out, "  {}", option.green())?;
                }
            }
            None => {
                writeln!(out, "{}", "Available actions:".yellow().bold())?;
                for entry in &self.catalog {
                    writeln!(out, "  {:<12} {}", entry.name.cyan(), entry.options.join(" ").dimmed())?;
                }
                writeln!(out, "\nRun 'actio help <action>' for the options of one action.")?;
            }
        }
        Ok(out)
    }
}

impl Action for Help {
    fn run(&mut self) -> Result<()> {
        print!("{}", self.render()?);
        Ok(())
    }

    fn accessors(&self) -> Accessors {
        Accessors::of::<Self>()
            .option("topic", Marks::new().index(0), |h| &h.topic, |h| &mut h.topic)
            .build()
    }

    fn markers(&self) -> ActionMarkers {
        ActionMarkers::default_action()
    }
}
