//! Component selection for the custom profile.

use anyhow::{Context, Result};
use dialoguer::MultiSelect;
use std::io::{self, BufRead, Write};

use crate::component::{Component, catalog};
use crate::terminal;

/// Picks optional components for a custom profile.
pub trait ComponentSelector {
    /// Return the keys of the chosen components.
    fn select(&mut self, optional: &[&'static Component]) -> Result<Vec<&'static str>>;
}

fn label(component: &Component) -> String {
    let requires: Vec<&str> = component
        .requires
        .iter()
        .copied()
        .filter(|key| *key != catalog::BASE)
        .collect();

    if requires.is_empty() {
        format!("{:<12} {}", component.key, component.description)
    } else {
        format!(
            "{:<12} {} (requires {})",
            component.key,
            component.description,
            requires.join(", ")
        )
    }
}

/// Checkbox menu drawn by dialoguer.
pub struct MenuSelector;

impl ComponentSelector for MenuSelector {
    fn select(&mut self, optional: &[&'static Component]) -> Result<Vec<&'static str>> {
        let items: Vec<String> = optional.iter().map(|c| label(c)).collect();

        let chosen = MultiSelect::new()
            .with_prompt("Select components (space to toggle, enter to confirm)")
            .items(&items)
            .interact()
            .context("Failed to read component selection")?;

        Ok(chosen.into_iter().map(|i| optional[i].key).collect())
    }
}

/// One yes/no line prompt per component, defaulting to no.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ComponentSelector for PromptSelector<R, W> {
    fn select(&mut self, optional: &[&'static Component]) -> Result<Vec<&'static str>> {
        let mut selected = Vec::new();

        for component in optional {
            write!(self.output, "Install {}? [y/N] ", label(component).trim_end())?;
            self.output.flush()?;

            let mut answer = String::new();
            // EOF answers no to everything that is left
            if self.input.read_line(&mut answer)? == 0 {
                writeln!(self.output)?;
                break;
            }

            if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                selected.push(component.key);
            }
        }

        Ok(selected)
    }
}

/// Silent mode: accept every prompt.
pub struct AutoSelector;

impl ComponentSelector for AutoSelector {
    fn select(&mut self, optional: &[&'static Component]) -> Result<Vec<&'static str>> {
        log::info!("Silent mode: selecting all {} optional components", optional.len());
        Ok(optional.iter().map(|c| c.key).collect())
    }
}

/// Pick the selector matching the terminal we're attached to.
pub fn for_terminal(silent: bool) -> Box<dyn ComponentSelector> {
    if silent {
        Box::new(AutoSelector)
    } else if terminal::supports_menu() {
        Box::new(MenuSelector)
    } else {
        Box::new(PromptSelector::new(io::stdin().lock(), io::stdout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn optional() -> Vec<&'static Component> {
        catalog::optional().collect()
    }

    #[test]
    fn test_auto_selects_everything() {
        let keys = AutoSelector.select(&optional()).unwrap();
        assert_eq!(keys.len(), catalog::all().len() - 1);
        assert!(!keys.contains(&catalog::BASE));
    }

    #[test]
    fn test_prompt_selector_reads_answers() {
        let components = optional();
        let answers = "y\n\nno\nYES\n n\ny\nmaybe\n";
        let mut output = Vec::new();
        let keys = PromptSelector::new(Cursor::new(answers), &mut output)
            .select(&components)
            .unwrap();

        assert_eq!(keys, vec!["shell", "neovim", "nvm"]);
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Install shell"));
        assert!(transcript.contains("(requires nvm)"));
    }

    #[test]
    fn test_prompt_selector_eof_means_no() {
        let components = optional();
        let mut output = Vec::new();
        let keys = PromptSelector::new(Cursor::new("y\n"), &mut output)
            .select(&components)
            .unwrap();

        assert_eq!(keys, vec!["shell"]);
    }

    #[test]
    fn test_silent_uses_auto_selector() {
        let mut selector = for_terminal(true);
        let keys = selector.select(&optional()).unwrap();
        assert_eq!(keys.len(), optional().len());
    }
}
