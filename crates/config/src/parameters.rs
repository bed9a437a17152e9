//! Parameters document: the validated root configuration of a pipeline run.

use crate::compat::apply_parameters_compat;
use crate::document::RawDocument;
use crate::schema::{
    FieldError, FieldRule, FieldSpec, FieldValidationError, UnknownKeys, finish, parse_row_limit,
    read_mapping, read_section,
};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::debug;

/// Default `project.name`.
pub const DEFAULT_PROJECT_NAME: &str = "job_posting_dq";
/// Default `project.timezone`.
pub const DEFAULT_TIMEZONE: &str = "Asia/Bangkok";
/// Default `llm.model_name`.
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";
/// Default `llm.temperature`.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
/// Inclusive lower bound of `llm.temperature`.
pub const MIN_TEMPERATURE: f64 = 0.0;
/// Inclusive upper bound of `llm.temperature`.
pub const MAX_TEMPERATURE: f64 = 2.0;
/// Default `llm.progress_log_every`.
pub const DEFAULT_PROGRESS_LOG_EVERY: u32 = 100;
/// Default `llm.max_workers`.
pub const DEFAULT_MAX_WORKERS: u32 = 4;
/// Default `llm.max_retries`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default `prompt_key`.
pub const DEFAULT_PROMPT_KEY: &str = "job_posting_dq_eval_v1";

/// Validated parameters document.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ParametersConfig {
    /// Project identity.
    pub project: ProjectConfig,
    /// Source and processed data paths.
    pub inputs: InputsConfig,
    /// LLM evaluation settings.
    pub llm: LlmConfig,
    /// Output locations.
    pub outputs: OutputsConfig,
    /// Template key selected from the prompt-template map.
    pub prompt_key: String,
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            inputs: InputsConfig::default(),
            llm: LlmConfig::default(),
            outputs: OutputsConfig::default(),
            prompt_key: DEFAULT_PROMPT_KEY.to_string(),
        }
    }
}

/// `project` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ProjectConfig {
    /// Project name.
    pub name: String,
    /// IANA timezone name used for run timestamps.
    pub timezone: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// `inputs` section. Paths are not checked for existence here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct InputsConfig {
    /// Raw postings CSV.
    pub raw_postings_csv: String,
    /// Raw job-description CSV.
    pub raw_jds_csv: String,
    /// Raw skills CSV.
    pub raw_skills_csv: String,
    /// Cleaned postings PSV.
    pub processed_postings_psv: String,
    /// Cleaned job-description PSV.
    pub processed_raw_psv: String,
    /// Cleaned skills PSV.
    pub processed_skills_psv: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            raw_postings_csv: "raw_data/Thailand_global_postings.csv".to_string(),
            raw_jds_csv: "raw_data/Thailand_global_raw.csv".to_string(),
            raw_skills_csv: "raw_data/Thailand_global_skills.csv".to_string(),
            processed_postings_psv: "process_data/Thailand_global_postings.psv".to_string(),
            processed_raw_psv: "process_data/Thailand_global_raw.psv".to_string(),
            processed_skills_psv: "process_data/Thailand_global_skills.psv".to_string(),
        }
    }
}

/// `llm` section.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct LlmConfig {
    /// Model name passed to the client.
    pub model_name: String,
    /// Sampling temperature, within `[0.0, 2.0]`.
    pub temperature: f64,
    /// Log progress every N rows (> 0).
    pub progress_log_every: u32,
    /// Worker pool size (> 0).
    pub max_workers: u32,
    /// Silence the LLM client's own logging.
    pub silence_client_lv_logs: bool,
    /// Require JSON-only responses.
    pub json_only: bool,
    /// Attempts per row (> 0).
    pub max_retries: u32,
    /// Row cap per run; `None` processes every row.
    pub max_rows_per_run: Option<u64>,
    /// Recompute rows that already have cached results.
    pub force: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            progress_log_every: DEFAULT_PROGRESS_LOG_EVERY,
            max_workers: DEFAULT_MAX_WORKERS,
            silence_client_lv_logs: false,
            json_only: true,
            max_retries: DEFAULT_MAX_RETRIES,
            max_rows_per_run: None,
            force: false,
        }
    }
}

/// `outputs` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct OutputsConfig {
    /// Root artifacts directory.
    pub artifacts_dir: String,
    /// Response cache directory.
    pub cache_dir: String,
    /// Reports directory.
    pub reports_dir: String,
    /// Evaluation results as JSON lines.
    pub job_postings_dq_eval_jsonl: String,
    /// Evaluation results as CSV.
    pub job_postings_dq_eval_csv: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: "artifacts".to_string(),
            cache_dir: "artifacts/cache".to_string(),
            reports_dir: "artifacts/reports".to_string(),
            job_postings_dq_eval_jsonl: "artifacts/job_postings_dq_eval.jsonl".to_string(),
            job_postings_dq_eval_csv: "artifacts/job_postings_dq_eval.csv".to_string(),
        }
    }
}

const ROOT_FIELDS: &[FieldSpec<ParametersConfig>] = &[
    FieldSpec {
        key: "project",
        rule: FieldRule::Nested(|config, value, path, errors| {
            config.project = read_section(value, path, PROJECT_FIELDS, UnknownKeys::Reject, errors);
        }),
    },
    FieldSpec {
        key: "inputs",
        rule: FieldRule::Nested(|config, value, path, errors| {
            config.inputs = read_section(value, path, INPUTS_FIELDS, UnknownKeys::Reject, errors);
        }),
    },
    FieldSpec {
        key: "llm",
        rule: FieldRule::Nested(|config, value, path, errors| {
            config.llm = read_section(value, path, LLM_FIELDS, UnknownKeys::Tolerate, errors);
        }),
    },
    FieldSpec {
        key: "outputs",
        rule: FieldRule::Nested(|config, value, path, errors| {
            config.outputs = read_section(value, path, OUTPUTS_FIELDS, UnknownKeys::Reject, errors);
        }),
    },
    FieldSpec {
        key: "prompt_key",
        rule: FieldRule::Text(|config, value| config.prompt_key = value),
    },
];

const PROJECT_FIELDS: &[FieldSpec<ProjectConfig>] = &[
    FieldSpec {
        key: "name",
        rule: FieldRule::Text(|project, value| project.name = value),
    },
    FieldSpec {
        key: "timezone",
        rule: FieldRule::Text(|project, value| project.timezone = value),
    },
];

const INPUTS_FIELDS: &[FieldSpec<InputsConfig>] = &[
    FieldSpec {
        key: "raw_postings_csv",
        rule: FieldRule::Text(|inputs, value| inputs.raw_postings_csv = value),
    },
    FieldSpec {
        key: "raw_jds_csv",
        rule: FieldRule::Text(|inputs, value| inputs.raw_jds_csv = value),
    },
    FieldSpec {
        key: "raw_skills_csv",
        rule: FieldRule::Text(|inputs, value| inputs.raw_skills_csv = value),
    },
    FieldSpec {
        key: "processed_postings_psv",
        rule: FieldRule::Text(|inputs, value| inputs.processed_postings_psv = value),
    },
    FieldSpec {
        key: "processed_raw_psv",
        rule: FieldRule::Text(|inputs, value| inputs.processed_raw_psv = value),
    },
    FieldSpec {
        key: "processed_skills_psv",
        rule: FieldRule::Text(|inputs, value| inputs.processed_skills_psv = value),
    },
];

const LLM_FIELDS: &[FieldSpec<LlmConfig>] = &[
    FieldSpec {
        key: "model_name",
        rule: FieldRule::Text(|llm, value| llm.model_name = value),
    },
    FieldSpec {
        key: "temperature",
        rule: FieldRule::FloatInRange {
            min: MIN_TEMPERATURE,
            max: MAX_TEMPERATURE,
            set: |llm, value| llm.temperature = value,
        },
    },
    FieldSpec {
        key: "progress_log_every",
        rule: FieldRule::Count {
            min: 1,
            null_keeps_default: true,
            set: |llm, value| llm.progress_log_every = value,
        },
    },
    FieldSpec {
        key: "max_workers",
        rule: FieldRule::Count {
            min: 1,
            null_keeps_default: false,
            set: |llm, value| llm.max_workers = value,
        },
    },
    FieldSpec {
        key: "silence_client_lv_logs",
        rule: FieldRule::Bool(|llm, value| llm.silence_client_lv_logs = value),
    },
    FieldSpec {
        key: "json_only",
        rule: FieldRule::Bool(|llm, value| llm.json_only = value),
    },
    FieldSpec {
        key: "max_retries",
        rule: FieldRule::Count {
            min: 1,
            null_keeps_default: false,
            set: |llm, value| llm.max_retries = value,
        },
    },
    FieldSpec {
        key: "max_rows_per_run",
        rule: FieldRule::Custom(|llm, value| {
            llm.max_rows_per_run = parse_row_limit(value)?;
            Ok(())
        }),
    },
    FieldSpec {
        key: "force",
        rule: FieldRule::Bool(|llm, value| llm.force = value),
    },
];

const OUTPUTS_FIELDS: &[FieldSpec<OutputsConfig>] = &[
    FieldSpec {
        key: "artifacts_dir",
        rule: FieldRule::Text(|outputs, value| outputs.artifacts_dir = value),
    },
    FieldSpec {
        key: "cache_dir",
        rule: FieldRule::Text(|outputs, value| outputs.cache_dir = value),
    },
    FieldSpec {
        key: "reports_dir",
        rule: FieldRule::Text(|outputs, value| outputs.reports_dir = value),
    },
    FieldSpec {
        key: "job_postings_dq_eval_jsonl",
        rule: FieldRule::Text(|outputs, value| outputs.job_postings_dq_eval_jsonl = value),
    },
    FieldSpec {
        key: "job_postings_dq_eval_csv",
        rule: FieldRule::Text(|outputs, value| outputs.job_postings_dq_eval_csv = value),
    },
];

impl ParametersConfig {
    /// Rewrite legacy keys, then validate the document.
    ///
    /// Every invalid field is reported; no partially valid config is returned.
    pub fn from_document(mut document: RawDocument) -> Result<Self, FieldValidationError> {
        let applied = apply_parameters_compat(&mut document);
        let config = Self::validate(&document)?;
        debug!(
            source = document.origin(),
            compat_rules = applied.len(),
            prompt_key = %config.prompt_key,
            "validated parameters"
        );
        Ok(config)
    }

    /// Validate a document as-is, without compatibility rewrites.
    pub fn validate(document: &RawDocument) -> Result<Self, FieldValidationError> {
        let mut errors: Vec<FieldError> = Vec::new();
        let config = read_mapping(
            document.root(),
            "",
            ROOT_FIELDS,
            UnknownKeys::Reject,
            &mut errors,
        );
        finish("parameters", document.origin(), errors, config)
    }
}
