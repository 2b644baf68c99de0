use crate::types::Result;
use dialoguer::Input;

/// Standardized single-line prompt used across binaries.
pub fn ask_line(prompt: &str) -> Result<String> {
    let line: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(line.trim().to_string())
}
