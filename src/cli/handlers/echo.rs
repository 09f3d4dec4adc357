// src/cli/handlers/echo.rs

use crate::core::{accessors::Accessors, action::Action};
use anyhow::{Result, bail};

/// Prints its text, optionally upper-cased and repeated.
///
/// Options come from the synopsis; `text` is bound through a getter/setter pair,
/// the flags through plain fields.
#[derive(Debug)]
pub struct Echo {
    words: String,
    times: i64,
    upper: bool,
}

impl Default for Echo {
    fn default() -> Self {
        Self {
            words: String::new(),
            times: 1,
            upper: false,
        }
    }
}

impl Echo {
    pub fn render(&self) -> Result<String> {
        if self.times < 1 {
            bail!("--times must be at least 1, got {}", self.times);
        }
        let line = if self.upper {
            self.words.to_uppercase()
        } else {
            self.words.clone()
        };
        let count = usize::try_from(self.times)?;
        Ok(vec![line; count].join("\n"))
    }
}

impl Action for Echo {
    fn run(&mut self) -> Result<()> {
        println!("{}", self.render()?);
        Ok(())
    }

    fn accessors(&self) -> Accessors {
        Accessors::of::<Self>()
            .getter("text", |e| e.words.clone())
            .setter("text", |e, text: String| e.words = text)
            .field("times", |e| &e.times, |e| &mut e.times)
            .field("upper", |e| &e.upper, |e| &mut e.upper)
            .build()
    }

    fn synopsis(&self) -> Option<&str> {
        Some("text [--times|n] [--upper|u]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ActionRegistry;

    #[test]
    fn test_render() {
        let echo = Echo {
            words: "hi".to_string(),
            times: 2,
            upper: true,
        };
        assert_eq!(echo.render().unwrap(), "HI\nHI");
        let zero = Echo {
            times: 0,
            ..Echo::default()
        };
        assert!(zero.render().is_err());
    }

    #[test]
    fn test_synopsis_options() {
        let registry = ActionRegistry::default();
        registry.register("echo", Echo::default()).unwrap();
        let binding = registry.lookup("echo").unwrap();
        let binding = binding.lock().unwrap();
        let listed: Vec<String> = binding.options().iter().map(ToString::to_string).collect();
        assert_eq!(listed, ["<text> (position 0)", "--times|-n", "--upper|-u"]);
        assert!(binding.options()[0].required);
        assert!(!binding.options()[1].required);
    }

    #[test]
    fn test_text_is_required() {
        let registry = ActionRegistry::default();
        registry.register("echo", Echo::default()).unwrap();
        let err = registry.dispatch("echo", &["-n", "2"]).unwrap_err();
        assert_eq!(err.to_string(), "Required option(s) missing: <text> (position 0)");
    }
}
