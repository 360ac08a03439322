use serde_json::{Map, Value};

use crate::core::errors::SetupError;

pub fn validate_config(config: &Value) -> Result<(), SetupError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_enum_field(
            generation,
            "generation.provider",
            "provider",
            &["ollama", "openai_compatible"],
        )?;
        validate_optional_string_field(generation, "generation.base_url", "base_url")?;
        validate_non_empty_string_field(generation, "generation.model", "model")?;
        validate_u64_field(generation, "generation.timeout_secs", "timeout_secs", 1, 86_400)?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_enum_field(
            embedding,
            "embedding.provider",
            "provider",
            &["cohere", "openai_compatible"],
        )?;
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_non_empty_string_field(embedding, "embedding.model", "model")?;
        validate_non_empty_string_field(embedding, "embedding.version", "version")?;
        validate_u64_field(embedding, "embedding.timeout_secs", "timeout_secs", 1, 86_400)?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_enum_field(retrieval, "retrieval.metric", "metric", &["l2", "cosine"])?;
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 1_000)?;
    }

    if let Some(parametric) = expect_optional_object(root, "parametric")? {
        validate_u64_field(
            parametric,
            "parametric.generations",
            "generations",
            1,
            10_000_000,
        )?;
        validate_temperature_field(
            parametric,
            "parametric.question_temperature",
            "question_temperature",
        )?;
        validate_temperature_field(
            parametric,
            "parametric.answer_temperature",
            "answer_temperature",
        )?;
        validate_u64_field(parametric, "parametric.max_tokens", "max_tokens", 1, 131_072)?;
        validate_u64_field(parametric, "parametric.flush_every", "flush_every", 1, 10_000)?;
    }

    if let Some(grounded) = expect_optional_object(root, "grounded")? {
        validate_u64_field(grounded, "grounded.chunk_size", "chunk_size", 1, 1_000)?;
        validate_temperature_field(
            grounded,
            "grounded.question_temperature",
            "question_temperature",
        )?;
        validate_u64_field(
            grounded,
            "grounded.question_max_tokens",
            "question_max_tokens",
            1,
            131_072,
        )?;
        validate_temperature_field(
            grounded,
            "grounded.answer_temperature",
            "answer_temperature",
        )?;
        validate_u64_field(
            grounded,
            "grounded.answer_max_tokens",
            "answer_max_tokens",
            1,
            131_072,
        )?;
        validate_u64_field(grounded, "grounded.flush_every", "flush_every", 1, 10_000)?;
        validate_enum_field(
            grounded,
            "grounded.query_mode",
            "query_mode",
            &["question", "seed_chunk"],
        )?;
        validate_optional_string_field(grounded, "grounded.source_tag", "source_tag")?;
    }

    if let Some(vectorize) = expect_optional_object(root, "vectorize")? {
        validate_u64_field(vectorize, "vectorize.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(
            vectorize,
            "vectorize.chunk_overlap",
            "chunk_overlap",
            0,
            1_000_000,
        )?;
        validate_u64_field(
            vectorize,
            "vectorize.min_chunk_chars",
            "min_chunk_chars",
            0,
            1_000_000,
        )?;
        validate_u64_field(vectorize, "vectorize.batch_size", "batch_size", 1, 4_096)?;
    }

    if let Some(logging) = expect_optional_object(root, "logging")? {
        validate_non_empty_string_field(logging, "logging.level", "level")?;
        validate_non_empty_string_field(logging, "logging.file_name", "file_name")?;
        if let Some(name) = logging.get("file_name").and_then(Value::as_str) {
            if name.contains(['/', '\\']) {
                return Err(SetupError::Config(
                    "'logging.file_name' must be a file name, not a path".to_string(),
                ));
            }
        }
        if let Some(stdout) = logging.get("stdout") {
            if !stdout.is_boolean() {
                return Err(config_type_error("logging.stdout", "boolean"));
            }
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, SetupError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), SetupError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(SetupError::Config(format!(
            "'{}' must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_temperature_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), SetupError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(0.0..=2.0).contains(&number) {
        return Err(SetupError::Config(format!(
            "'{}' must be between 0 and 2",
            path
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), SetupError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(SetupError::Config(format!(
            "'{}' cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), SetupError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), SetupError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if allowed.contains(&text) {
        return Ok(());
    }
    Err(SetupError::Config(format!(
        "'{}' must be one of: {}",
        path,
        allowed.join(", ")
    )))
}

fn config_type_error(path: &str, expected: &str) -> SetupError {
    SetupError::Config(format!("'{}': expected {}", path, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_partial_documents() {
        validate_config(&json!({})).unwrap();
        validate_config(&json!({
            "retrieval": { "metric": "l2", "top_k": 3 },
            "grounded": { "query_mode": "seed_chunk", "source_tag": null }
        }))
        .unwrap();
    }

    #[test]
    fn rejects_unknown_metric() {
        let err = validate_config(&json!({ "retrieval": { "metric": "manhattan" } })).unwrap_err();
        assert!(err.to_string().contains("retrieval.metric"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(validate_config(&json!({ "retrieval": { "top_k": 0 } })).is_err());
        assert!(validate_config(&json!({ "parametric": { "question_temperature": 2.5 } })).is_err());
        assert!(validate_config(&json!({ "grounded": { "chunk_size": "five" } })).is_err());
    }

    #[test]
    fn logging_section_is_checked() {
        validate_config(&json!({
            "logging": { "level": "medqa_synth=debug", "file_name": "run.log", "stdout": false }
        }))
        .unwrap();
        assert!(validate_config(&json!({ "logging": { "file_name": "../run.log" } })).is_err());
        assert!(validate_config(&json!({ "logging": { "level": " " } })).is_err());
        assert!(validate_config(&json!({ "logging": { "stdout": "yes" } })).is_err());
    }

    #[test]
    fn min_chunk_chars_accepts_zero() {
        validate_config(&json!({ "vectorize": { "min_chunk_chars": 0 } })).unwrap();
        assert!(validate_config(&json!({ "vectorize": { "min_chunk_chars": -1 } })).is_err());
    }

    #[test]
    fn rejects_non_object_sections() {
        assert!(validate_config(&json!({ "embedding": "cohere" })).is_err());
        assert!(validate_config(&json!([])).is_err());
    }
}
