//! CLI integration tests.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../crates/config/tests/fixtures")
        .join(name)
}

fn temp_workdir(prefix: &str) -> Result<PathBuf, Box<dyn Error>> {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{nanos}"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Run `jpdq` in `workdir` with a scrubbed environment plus `extra_env`.
fn run_cli(workdir: &Path, args: &[&str], extra_env: &[(&str, &str)]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_jpdq"));
    command.current_dir(workdir).args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("GEMINI_") || key.starts_with("JPDQ_") || key == "RUST_LOG" {
            command.env_remove(key);
        }
    }
    for (key, value) in extra_env {
        command.env(key, value);
    }
    command.output()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn help_lists_commands() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-help")?;
    let output = run_cli(&workdir, &["--help"], &[])?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    for command in ["config", "prompts", "env", "init"] {
        assert!(stdout.contains(command), "missing {command}");
    }
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn config_check_runs_startup_sequence() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-check")?;
    let parameters = path_arg(&fixture("parameters.valid.yaml"));
    let credentials = path_arg(&fixture("credentials.valid.yaml"));
    let prompts = path_arg(&fixture("prompts.valid.yaml"));

    let output = run_cli(
        &workdir,
        &[
            "config",
            "check",
            "--parameters",
            &parameters,
            "--credentials",
            &credentials,
            "--prompts",
            &prompts,
        ],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("status: ok\n"));
    assert!(stdout.contains("prompt_key: job_posting_dq_eval_v1\n"));
    assert!(stdout.contains("templates: 2\n"));

    for dir in ["artifacts", "artifacts/cache", "artifacts/reports", "process_data", "raw_data"] {
        assert!(workdir.join(dir).is_dir(), "missing {dir}");
    }
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn invalid_parameters_exit_with_invalid_input() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-invalid")?;
    let parameters = path_arg(&fixture("parameters.invalid.yaml"));

    let output = run_cli(
        &workdir,
        &["config", "show", "--parameters", &parameters, "--output", "json"],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(2));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["code"]["code"], "invalid_fields");
    assert_eq!(
        value["error"]["metadata"]["field.llm.max_workers"],
        "must be > 0 (got 0)"
    );
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn config_show_prints_validated_parameters() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-show")?;
    let parameters = path_arg(&fixture("parameters.legacy.yaml"));

    let output = run_cli(
        &workdir,
        &["--output", "json", "config", "show", "--parameters", &parameters],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["parameters"]["outputs"]["artifacts_dir"], "artifacts_old");
    assert_eq!(value["parameters"]["llm"]["max_rows_per_run"], 200);
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn env_check_resolves_without_printing_the_key() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-env")?;
    let credentials = path_arg(&fixture("credentials.valid.yaml"));

    let output = run_cli(
        &workdir,
        &["env", "check", "--credentials", &credentials],
        &[
            ("JPDQ_TEST_GEMINI_KEY", "super-secret-value"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
        ],
    )?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("model_name: gemini-2.5-pro\n"));
    assert!(stdout.contains("api_key: [REDACTED]\n"));
    assert!(!stdout.contains("super-secret-value"));
    assert!(!String::from_utf8(output.stderr)?.contains("super-secret-value"));
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn env_check_reports_missing_variable() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-env-missing")?;
    let credentials = path_arg(&fixture("credentials.valid.yaml"));

    let output = run_cli(
        &workdir,
        &["env", "check", "--credentials", &credentials, "--model", "m"],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("code: config:missing_environment\n"));
    assert!(stdout.contains("  var: JPDQ_TEST_GEMINI_KEY\n"));
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn env_file_in_workdir_is_loaded() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-dotenv")?;
    std::fs::write(
        workdir.join(".env"),
        "GEMINI_API_KEY=from-dotenv\nGEMINI_MODEL=dotenv-model\n",
    )?;
    let credentials = path_arg(&fixture("credentials.empty.yaml"));

    let output = run_cli(&workdir, &["env", "check", "--credentials", &credentials], &[])?;
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout)?.contains("model_name: dotenv-model\n"));
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn prompts_commands_read_both_document_shapes() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-prompts")?;
    let prompts = path_arg(&fixture("prompts.valid.yaml"));
    let prompt = path_arg(&fixture("prompt.yaml"));

    let output = run_cli(
        &workdir,
        &["prompts", "list", "--prompts", &prompts, "--output", "json"],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        value["keys"],
        serde_json::json!(["job_posting_dq_eval_v1", "job_posting_dq_eval_v2"])
    );

    let output = run_cli(&workdir, &["prompts", "show-system", "--prompt", &prompt], &[])?;
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout)?.starts_with("You evaluate job postings"));

    let missing_meta = path_arg(&fixture("prompts.missing-meta.yaml"));
    let output = run_cli(&workdir, &["prompts", "list", "--prompts", &missing_meta], &[])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.contains("code: config:schema_error\n"));
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn init_without_parameters_uses_defaults() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-init")?;
    let output = run_cli(&workdir, &["init"], &[])?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("  - artifacts/cache\n"));
    assert!(workdir.join("raw_data").is_dir());

    let again = run_cli(&workdir, &["init"], &[])?;
    assert_eq!(again.status.code(), Some(0));
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}

#[test]
fn schema_command_prints_json_schema() -> Result<(), Box<dyn Error>> {
    let workdir = temp_workdir("jpdq-schema")?;
    let output = run_cli(&workdir, &["config", "schema", "parameters"], &[])?;
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert!(value["properties"]["llm"].is_object());
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}
