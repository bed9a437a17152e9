//! Prompt command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, to_json_output};
use job_posting_dq_config::{load_prompt_templates, load_system_prompt};
use std::path::Path;

/// Run `prompts list`.
pub fn run_prompts_list(mode: OutputMode, prompts: &Path) -> Result<CliOutput, CliError> {
    let templates = match load_prompt_templates(prompts) {
        Ok(templates) => templates,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "promptsPath": prompts.display().to_string(),
            "keys": templates.keys().collect::<Vec<_>>(),
        }))?
    } else {
        let mut out = format!("status: ok\ntemplates: {}\n", templates.len());
        for (key, body) in templates.iter() {
            out.push_str(&format!("  - {key} ({} chars)\n", body.chars().count()));
        }
        out
    };

    Ok(CliOutput::ok(stdout))
}

/// Run `prompts show-system`. Text mode prints the prompt body only.
pub fn run_prompts_show_system(mode: OutputMode, prompt: &Path) -> Result<CliOutput, CliError> {
    let system_prompt = match load_system_prompt(prompt) {
        Ok(system_prompt) => system_prompt,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "promptPath": prompt.display().to_string(),
            "systemPrompt": system_prompt,
        }))?
    } else if system_prompt.ends_with('\n') {
        system_prompt
    } else {
        format!("{system_prompt}\n")
    };

    Ok(CliOutput::ok(stdout))
}
