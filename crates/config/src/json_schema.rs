//! JSON Schema exports of the validated configuration shapes.

use crate::credentials::CredentialsConfig;
use crate::parameters::ParametersConfig;
use schemars::{Schema, schema_for};

/// JSON Schema for [`ParametersConfig`].
#[must_use]
pub fn parameters_schema() -> Schema {
    schema_for!(ParametersConfig)
}

/// JSON Schema for [`CredentialsConfig`].
#[must_use]
pub fn credentials_schema() -> Schema {
    schema_for!(CredentialsConfig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_name_every_section() {
        let parameters = serde_json::to_value(parameters_schema()).unwrap_or_default();
        let properties = parameters.get("properties");
        for section in ["project", "inputs", "llm", "outputs", "prompt_key"] {
            assert!(
                properties.and_then(|value| value.get(section)).is_some(),
                "missing {section}"
            );
        }

        let credentials = serde_json::to_value(credentials_schema()).unwrap_or_default();
        assert!(
            credentials
                .get("properties")
                .and_then(|value| value.get("gemini"))
                .is_some()
        );
    }
}
