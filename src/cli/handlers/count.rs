// src/cli/handlers/count.rs

use crate::core::{
    accessors::{Accessors, Marks},
    action::Action,
};
use anyhow::{Context, Result};
use colored::*;
use std::{fs, path::PathBuf};

/// Line, word and byte counts of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub lines: usize,
    pub words: usize,
    pub bytes: usize,
}

impl Counts {
    pub fn of(text: &str) -> Self {
        Self {
            lines: text.lines().count(),
            words: text.split_whitespace().count(),
            bytes: text.len(),
        }
    }
}

/// Counts lines, words and bytes of a file. With no flag, all three are shown.
#[derive(Debug, Default)]
pub struct Count {
    path: PathBuf,
    lines: bool,
    words: bool,
}

impl Count {
    pub fn report(&self) -> Result<String> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read '{}'", self.path.display()))?;
        let counts = Counts::of(&text);

        let show_all = !self.lines && !self.words;
        let mut parts = Vec::new();
        if show_all || self.lines {
            parts.push(format!("{} lines", counts.lines));
        }
        if show_all || self.words {
            parts.push(format!("{} words", counts.words));
        }
        if show_all {
            parts.push(format!("{} bytes", counts.bytes));
        }
        Ok(parts.join(", "))
    }
}

impl Action for Count {
    fn run(&mut self) -> Result<()> {
        let report = self.report()?;
        println!("{}: {}", self.path.display().to_string().cyan(), report);
        Ok(())
    }

    fn accessors(&self) -> Accessors {
        Accessors::of::<Self>()
            .option("path", Marks::new().index(0).required(), |c| &c.path, |c| &mut c.path)
            .option("lines", Marks::new().alias('l'), |c| &c.lines, |c| &mut c.lines)
            .option("words", Marks::new().alias('w'), |c| &c.words, |c| &mut c.words)
            .build()
    }
}
