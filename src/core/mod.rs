// src/core/mod.rs

pub mod accessors;
pub mod action;
pub mod arg_parser;
pub mod binding;
pub mod config_loader;
pub mod converters;
pub mod grammar;
pub mod grammar_strategy;
pub mod member_strategy;
pub mod paths;
pub mod registry;
pub mod strategy;
pub mod target_resolver;
