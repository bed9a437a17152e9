//! Print a default configuration document as YAML.
//!
//! Usage: `print_default_config <parameters|credentials>`. Each run prints
//! one document, ready to save as `configs/parameters.yaml` or
//! `configs/credentials.yaml`.

use job_posting_dq_config::{CredentialsConfig, ParametersConfig, to_yaml};
use std::io;
use std::io::Write;

const USAGE: &str = "usage: print_default_config <parameters|credentials>";

fn main() -> std::process::ExitCode {
    let Some(document) = std::env::args().nth(1) else {
        eprintln!("{USAGE}");
        return std::process::ExitCode::from(2);
    };
    match render(&document) {
        Ok(Some(yaml)) => match write_stdout(&yaml) {
            Ok(()) => std::process::ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error}");
                std::process::ExitCode::from(1)
            },
        },
        Ok(None) => {
            eprintln!("unknown document {document:?}; {USAGE}");
            std::process::ExitCode::from(2)
        },
        Err(error) => {
            eprintln!("error: {error}");
            std::process::ExitCode::from(1)
        },
    }
}

fn render(document: &str) -> Result<Option<String>, job_posting_dq_shared::ErrorEnvelope> {
    match document {
        "parameters" => to_yaml(&ParametersConfig::default()).map(Some),
        "credentials" => to_yaml(&CredentialsConfig::default()).map(Some),
        _ => Ok(None),
    }
}

fn write_stdout(yaml: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(yaml.as_bytes())?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_posting_dq_config::{DocumentFormat, parse_credentials, parse_parameters};
    use std::error::Error;

    #[test]
    fn printed_documents_load_back_as_defaults() -> Result<(), Box<dyn Error>> {
        let parameters = render("parameters")?.ok_or("parameters not rendered")?;
        assert_eq!(
            parse_parameters(&parameters, DocumentFormat::Yaml)?,
            ParametersConfig::default()
        );

        let credentials = render("credentials")?.ok_or("credentials not rendered")?;
        assert_eq!(
            parse_credentials(&credentials, DocumentFormat::Yaml)?,
            CredentialsConfig::default()
        );
        Ok(())
    }

    #[test]
    fn unknown_document_is_not_rendered() -> Result<(), Box<dyn Error>> {
        assert_eq!(render("prompts")?, None);
        Ok(())
    }
}
