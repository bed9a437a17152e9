//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{
    run_config_check, run_config_schema, run_config_show, run_env_check, run_init,
    run_prompts_list, run_prompts_show_system,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use job_posting_dq_config::{
    DEFAULT_CREDENTIALS_PATH, DEFAULT_PARAMETERS_PATH, DEFAULT_PROMPT_PATH, DEFAULT_PROMPTS_PATH,
};
use job_posting_dq_shared::{ErrorEnvelope, redact_if_secret};
use logging::{LogArgs, init_tracing};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "jpdq",
    version,
    about = "Job-posting data-quality pipeline configuration CLI",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    logging: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Prompt-template commands.
    Prompts {
        #[command(subcommand)]
        command: PromptsCommands,
    },
    /// Environment resolution commands.
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
    /// Create the output and working directories.
    Init {
        /// Parameters document. Defaults to `configs/parameters.yaml`, or to
        /// built-in defaults when that file does not exist.
        #[arg(long)]
        parameters: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Run the full startup sequence and report the result.
    Check {
        #[arg(long, default_value = DEFAULT_PARAMETERS_PATH)]
        parameters: PathBuf,
        #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
        credentials: PathBuf,
        #[arg(long, default_value = DEFAULT_PROMPTS_PATH)]
        prompts: PathBuf,
    },
    /// Print the validated parameters.
    Show {
        #[arg(long, default_value = DEFAULT_PARAMETERS_PATH)]
        parameters: PathBuf,
    },
    /// Print the JSON Schema of a document kind.
    Schema {
        #[arg(value_enum)]
        document: SchemaDocument,
    },
}

#[derive(Debug, Subcommand)]
enum PromptsCommands {
    /// List template keys.
    List {
        #[arg(long, default_value = DEFAULT_PROMPTS_PATH)]
        prompts: PathBuf,
    },
    /// Print the single system prompt.
    ShowSystem {
        #[arg(long, default_value = DEFAULT_PROMPT_PATH)]
        prompt: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum EnvCommands {
    /// Resolve LLM client settings from credentials and the environment.
    Check {
        #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
        credentials: PathBuf,
        /// Model name override (otherwise `GEMINI_MODEL`).
        #[arg(long)]
        model: Option<String>,
    },
}

/// Document kinds with an exported JSON Schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SchemaDocument {
    Parameters,
    Credentials,
}

pub(crate) struct CliOutput {
    stdout: String,
    exit_code: ExitCode,
}

impl CliOutput {
    /// Successful output.
    pub(crate) const fn ok(stdout: String) -> Self {
        Self {
            stdout,
            exit_code: ExitCode::Ok,
        }
    }
}

fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.logging);
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Check {
                parameters,
                credentials,
                prompts,
            } => run_config_check(mode, parameters, credentials, prompts),
            ConfigCommands::Show { parameters } => run_config_show(mode, parameters),
            ConfigCommands::Schema { document } => run_config_schema(*document),
        },
        Commands::Prompts { command } => match command {
            PromptsCommands::List { prompts } => run_prompts_list(mode, prompts),
            PromptsCommands::ShowSystem { prompt } => run_prompts_show_system(mode, prompt),
        },
        Commands::Env { command } => match command {
            EnvCommands::Check { credentials, model } => {
                run_env_check(mode, credentials, model.as_deref())
            },
        },
        Commands::Init { parameters } => run_init(mode, parameters.as_deref()),
    }
}

/// Render a config-layer failure; the process exit code follows the error.
pub(crate) fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let exit_code = ExitCode::for_envelope(error);
    let mut error = error.clone();
    for (key, value) in &mut error.metadata {
        *value = redact_if_secret(key, value);
    }

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error,
        });
        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_error_text(&error)
    };

    CliOutput { stdout, exit_code }
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code.to_string());
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(&error.kind.to_string());
    out.push('\n');

    if !error.metadata.is_empty() {
        out.push_str("meta:\n");
        for (key, value) in &error.metadata {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }

    out
}

/// Pretty JSON with a trailing newline.
pub(crate) fn to_json_output(payload: &serde_json::Value) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(payload)?;
    output.push('\n');
    Ok(output)
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
