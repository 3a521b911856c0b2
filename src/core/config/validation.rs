use serde_json::{Map, Value};

use crate::core::errors::AssistantError;

pub fn validate_config(config: &Value) -> Result<(), AssistantError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(credentials) = expect_optional_object(root, "credentials")? {
        for key in [
            "google_api_key",
            "openai_api_key",
            "groq_api_key",
            "serper_api_key",
        ] {
            validate_optional_string_field(credentials, &format!("credentials.{key}"), key)?;
        }
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.default_provider", "default_provider")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_f64_field(llm, "llm.vision_temperature", "vision_temperature", 0.0, 2.0)?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.chunk_size", "chunk_size", 1, 100_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 100_000)?;
        validate_u64_field(
            rag,
            "rag.max_retrieved_docs",
            "max_retrieved_docs",
            1,
            100,
        )?;
        validate_u64_field(rag, "rag.max_file_size_mb", "max_file_size_mb", 1, 1_024)?;

        let size = rag.get("chunk_size").and_then(Value::as_u64);
        let overlap = rag.get("chunk_overlap").and_then(Value::as_u64);
        if let (Some(size), Some(overlap)) = (size, overlap) {
            if overlap >= size {
                return Err(AssistantError::config(format!(
                    "Invalid config at 'rag.chunk_overlap': must be smaller than chunk_size ({})",
                    size
                )));
            }
        }
    }

    if let Some(search) = expect_optional_object(root, "search")? {
        validate_u64_field(
            search,
            "search.max_search_results",
            "max_search_results",
            1,
            100,
        )?;
        validate_optional_string_field(search, "search.endpoint", "endpoint")?;
    }

    if let Some(response) = expect_optional_object(root, "response")? {
        validate_u64_field(
            response,
            "response.concise_max_tokens",
            "concise_max_tokens",
            1,
            32_768,
        )?;
        validate_u64_field(
            response,
            "response.detailed_max_tokens",
            "detailed_max_tokens",
            1,
            32_768,
        )?;
    }

    if let Some(context) = expect_optional_object(root, "context")? {
        validate_optional_string_field(context, "context.system_prompt", "system_prompt")?;
        validate_u64_field(
            context,
            "context.source_timeout_secs",
            "source_timeout_secs",
            1,
            600,
        )?;
    }

    if let Some(image) = expect_optional_object(root, "image")? {
        validate_u64_field(image, "image.max_image_size_mb", "max_image_size_mb", 1, 100)?;
        validate_u64_field(image, "image.max_dimension", "max_dimension", 64, 8_192)?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, AssistantError> {
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
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(AssistantError::config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(AssistantError::config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AssistantError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(AssistantError::config(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> AssistantError {
    AssistantError::config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_default_like_documents() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "rag": { "chunk_size": 1000, "chunk_overlap": 200, "max_retrieved_docs": 4 },
            "search": { "max_search_results": 5 },
            "response": { "concise_max_tokens": 150, "detailed_max_tokens": 1000 }
        }))
        .is_ok());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let err = validate_config(&json!({
            "rag": { "chunk_size": 200, "chunk_overlap": 200 }
        }))
        .unwrap_err();
        assert!(matches!(err, AssistantError::Config(msg) if msg.contains("chunk_overlap")));
    }

    #[test]
    fn rejects_wrong_types_and_ranges() {
        assert!(validate_config(&json!({ "rag": "big" })).is_err());
        assert!(validate_config(&json!({ "rag": { "chunk_size": "1000" } })).is_err());
        assert!(validate_config(&json!({ "search": { "max_search_results": 0 } })).is_err());
        assert!(validate_config(&json!({ "llm": { "temperature": 3.5 } })).is_err());
        assert!(validate_config(&json!({ "server": { "cors_allowed_origins": [""] } })).is_err());
    }
}
