//! Command implementations for mosctl CLI

pub mod report;
pub mod schema;
pub mod submit;

use std::io::IsTerminal;

use anyhow::{bail, Result};
use inquire::Confirm;

/// Ask a yes/no question, or fail with `hint` when nobody can answer it.
pub(crate) fn confirm(prompt: &str, hint: &str) -> Result<bool> {
    if !(std::io::stdin().is_terminal() && std::io::stdout().is_terminal()) {
        bail!("{} (not running in a terminal; {})", prompt, hint);
    }
    Ok(Confirm::new(prompt).with_default(false).prompt()?)
}
