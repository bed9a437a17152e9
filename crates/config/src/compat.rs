//! Backward-compatibility rewrites applied to raw documents.
//!
//! Rules run in order before validation. Each one is a no-op unless its
//! precondition holds, and none of them can fail: they only rename keys
//! they recognize, or drop a legacy key the current key shadows.

use crate::document::RawDocument;
use serde_yaml_ng::{Mapping, Value};
use tracing::warn;

/// A named rewrite over a document root.
#[derive(Debug, Clone, Copy)]
pub struct CompatRule {
    /// Stable rule name, reported when the rule fires.
    pub name: &'static str,
    /// Applies the rewrite; returns `true` when the root was changed.
    pub apply: fn(&mut Mapping) -> bool,
}

/// Rules for parameters documents, in application order.
pub const PARAMETERS_COMPAT_RULES: &[CompatRule] = &[
    CompatRule {
        name: "input_to_inputs",
        apply: rename_input_section,
    },
    CompatRule {
        name: "drop_shadowed_input",
        apply: drop_shadowed_input,
    },
    CompatRule {
        name: "outputs_artifacts_dir",
        apply: rename_artifacts_dir,
    },
];

const LEGACY_ARTIFACTS_DIR_KEYS: [&str; 2] = ["artifact_dir", "artifact_folder"];

/// Apply `rules` in order, returning the names of the rules that fired.
pub fn apply_compat_rules(document: &mut RawDocument, rules: &[CompatRule]) -> Vec<&'static str> {
    let mut applied = Vec::new();
    for rule in rules {
        if (rule.apply)(document.root_mut()) {
            warn!(
                rule = rule.name,
                source = document.origin(),
                "rewrote legacy config key"
            );
            applied.push(rule.name);
        }
    }
    applied
}

/// Apply [`PARAMETERS_COMPAT_RULES`].
pub fn apply_parameters_compat(document: &mut RawDocument) -> Vec<&'static str> {
    apply_compat_rules(document, PARAMETERS_COMPAT_RULES)
}

/// `input:` (singular) becomes `inputs:` when `inputs` is absent and
/// `input` holds a mapping.
fn rename_input_section(root: &mut Mapping) -> bool {
    if root.contains_key("inputs") || !root.get("input").is_some_and(Value::is_mapping) {
        return false;
    }
    rename_key(root, "input", "inputs")
}

/// A legacy `input` next to a current `inputs` is ignored.
fn drop_shadowed_input(root: &mut Mapping) -> bool {
    root.contains_key("inputs") && root.remove("input").is_some()
}

fn rename_artifacts_dir(root: &mut Mapping) -> bool {
    let Some(Value::Mapping(outputs)) = root.get_mut("outputs") else {
        return false;
    };
    if outputs.contains_key("artifacts_dir") {
        return false;
    }
    LEGACY_ARTIFACTS_DIR_KEYS
        .iter()
        .any(|legacy| rename_key(outputs, legacy, "artifacts_dir"))
}

/// Move `from` to `to`, keeping the value. Returns `false` if `from` is absent.
fn rename_key(mapping: &mut Mapping, from: &str, to: &str) -> bool {
    match mapping.remove(from) {
        Some(value) => {
            mapping.insert(Value::String(to.to_string()), value);
            true
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, INLINE_ORIGIN, parse_document};
    use std::error::Error;

    fn yaml(text: &str) -> Result<RawDocument, Box<dyn Error>> {
        Ok(parse_document(text, DocumentFormat::Yaml, INLINE_ORIGIN)?)
    }

    #[test]
    fn renames_singular_input_section() -> Result<(), Box<dyn Error>> {
        let mut document = yaml("input:\n  raw_postings_csv: a.csv\n")?;
        let applied = apply_parameters_compat(&mut document);
        assert_eq!(applied, vec!["input_to_inputs"]);
        assert!(document.get("input").is_none());
        let path = document
            .get("inputs")
            .and_then(|inputs| inputs.get("raw_postings_csv"))
            .and_then(Value::as_str);
        assert_eq!(path, Some("a.csv"));
        Ok(())
    }

    #[test]
    fn current_inputs_shadow_legacy_input() -> Result<(), Box<dyn Error>> {
        let mut document =
            yaml("inputs:\n  raw_postings_csv: b.csv\ninput:\n  raw_postings_csv: a.csv\n")?;
        assert_eq!(apply_parameters_compat(&mut document), vec!["drop_shadowed_input"]);
        assert!(document.get("input").is_none());
        let path = document
            .get("inputs")
            .and_then(|inputs| inputs.get("raw_postings_csv"))
            .and_then(Value::as_str);
        assert_eq!(path, Some("b.csv"));
        Ok(())
    }

    #[test]
    fn leaves_scalar_input_alone() -> Result<(), Box<dyn Error>> {
        let mut document = yaml("input: raw.csv\n")?;
        assert!(apply_parameters_compat(&mut document).is_empty());
        assert_eq!(document.get("input").and_then(Value::as_str), Some("raw.csv"));
        Ok(())
    }

    #[test]
    fn renames_legacy_artifact_dir_in_order() -> Result<(), Box<dyn Error>> {
        let mut document = yaml("outputs:\n  artifact_dir: out\n  artifact_folder: other\n")?;
        let applied = apply_parameters_compat(&mut document);
        assert_eq!(applied, vec!["outputs_artifacts_dir"]);

        let outputs = document
            .get("outputs")
            .and_then(Value::as_mapping)
            .ok_or_else(|| std::io::Error::other("outputs missing"))?;
        assert_eq!(outputs.get("artifacts_dir").and_then(Value::as_str), Some("out"));
        assert!(outputs.contains_key("artifact_folder"));
        Ok(())
    }

    #[test]
    fn current_artifacts_dir_wins_over_legacy() -> Result<(), Box<dyn Error>> {
        let mut document = yaml("outputs:\n  artifacts_dir: new\n  artifact_dir: old\n")?;
        assert!(apply_parameters_compat(&mut document).is_empty());
        Ok(())
    }

    #[test]
    fn rules_never_touch_unrelated_documents() -> Result<(), Box<dyn Error>> {
        let mut document = yaml("project:\n  name: demo\n")?;
        let before = document.clone();
        assert!(apply_parameters_compat(&mut document).is_empty());
        assert_eq!(document, before);
        Ok(())
    }
}
