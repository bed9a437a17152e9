//! Config command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, SchemaDocument, format_error_output, to_json_output};
use job_posting_dq_config::{
    ParametersConfig, credentials_schema, ensure_dirs, load_credentials, load_parameters,
    load_prompt_templates, parameters_schema, to_yaml,
};
use job_posting_dq_shared::ErrorEnvelope;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a successful startup sequence produced.
struct StartupReport {
    params: ParametersConfig,
    api_key_env: String,
    templates: usize,
    directories: Vec<PathBuf>,
}

/// Load everything a pipeline run loads at startup, in the same order.
fn startup_check(
    parameters: &Path,
    credentials: &Path,
    prompts: &Path,
) -> Result<StartupReport, ErrorEnvelope> {
    let params = load_parameters(parameters)?;
    let directories = ensure_dirs(&params)?;
    let credentials = load_credentials(credentials)?;
    let templates = load_prompt_templates(prompts)?;
    templates.require(&params.prompt_key)?;

    Ok(StartupReport {
        api_key_env: credentials.gemini.api_key_env,
        templates: templates.len(),
        directories,
        params,
    })
}

/// Run `config check`.
pub fn run_config_check(
    mode: OutputMode,
    parameters: &Path,
    credentials: &Path,
    prompts: &Path,
) -> Result<CliOutput, CliError> {
    let report = match startup_check(parameters, credentials, prompts) {
        Ok(report) => report,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    info!(parameters = %parameters.display(), "config check completed");

    let directories = report
        .directories
        .iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>();

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "parametersPath": parameters.display().to_string(),
            "credentialsPath": credentials.display().to_string(),
            "promptsPath": prompts.display().to_string(),
            "promptKey": report.params.prompt_key,
            "modelName": report.params.llm.model_name,
            "apiKeyEnv": report.api_key_env,
            "templates": report.templates,
            "directories": directories,
        }))?
    } else {
        let mut out = format!(
            "status: ok\nparameters: {}\ncredentials: {}\nprompts: {}\nprompt_key: {}\nmodel_name: {}\napi_key_env: {}\ntemplates: {}\ndirectories:\n",
            parameters.display(),
            credentials.display(),
            prompts.display(),
            report.params.prompt_key,
            report.params.llm.model_name,
            report.api_key_env,
            report.templates,
        );
        for dir in &directories {
            out.push_str("  - ");
            out.push_str(dir);
            out.push('\n');
        }
        out
    };

    Ok(CliOutput::ok(stdout))
}

/// Run `config show`.
pub fn run_config_show(mode: OutputMode, parameters: &Path) -> Result<CliOutput, CliError> {
    let params = match load_parameters(parameters) {
        Ok(params) => params,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let stdout = if mode.is_json() {
        to_json_output(&serde_json::json!({
            "status": "ok",
            "parametersPath": parameters.display().to_string(),
            "parameters": serde_json::to_value(&params)?,
        }))?
    } else {
        let mut out = format!("status: ok\nparameters: {}\n---\n", parameters.display());
        out.push_str(&to_yaml(&params)?);
        out
    };

    Ok(CliOutput::ok(stdout))
}

/// Run `config schema`. The schema is JSON regardless of output mode.
pub fn run_config_schema(document: SchemaDocument) -> Result<CliOutput, CliError> {
    let schema = match document {
        SchemaDocument::Parameters => parameters_schema(),
        SchemaDocument::Credentials => credentials_schema(),
    };
    let stdout = to_json_output(&serde_json::to_value(&schema)?)?;
    Ok(CliOutput::ok(stdout))
}
