use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

const MAX_ATTEMPTS: usize = 3;

/// Asks the generation provider for structured JSON. The model is retried
/// a few times when it returns content that does not parse; any transport
/// failure surfaces immediately.
pub async fn generate(
	cfg: &aura_config::GenerationProviderConfig,
	messages: &[Value],
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);

	for _ in 0..MAX_ATTEMPTS {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"messages": messages,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		if let Ok(parsed) = parse_generation_json(json) {
			return Ok(parsed);
		}
	}

	Err(Error::InvalidResponse {
		message: "Generation response is not valid JSON.".to_string(),
	})
}

fn parse_generation_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		let parsed: Value = serde_json::from_str(content).map_err(|_| Error::InvalidResponse {
			message: "Generation content is not valid JSON.".to_string(),
		})?;

		return Ok(parsed);
	}

	if json.is_object() {
		return Ok(json);
	}

	Err(Error::InvalidResponse {
		message: "Generation response is missing JSON content.".to_string(),
	})
}
