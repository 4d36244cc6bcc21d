use std::collections::HashSet;

use serde_json::Value;

use crate::DiscoveryService;
use aura_domain::language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpansionMode {
	Off,
	Always,
	Dynamic,
}

pub(crate) fn resolve_expansion_mode(cfg: &aura_config::Config) -> ExpansionMode {
	match cfg.search.expansion.mode.as_str() {
		"always" => ExpansionMode::Always,
		"dynamic" => ExpansionMode::Dynamic,
		_ => ExpansionMode::Off,
	}
}

/// Dynamic expansion only fires for queries that do not already read as
/// the index language; translations are what buy extra lexical recall.
pub(crate) fn should_expand(mode: ExpansionMode, declared: Option<&str>, query: &str) -> bool {
	match mode {
		ExpansionMode::Off => false,
		ExpansionMode::Always => true,
		ExpansionMode::Dynamic => {
			let code = declared.map(str::to_string).or_else(|| {
				language::detect(query).map(str::to_string)
			});

			match code {
				Some(code) => !language::is_english(&code),
				None => false,
			}
		},
	}
}

impl DiscoveryService {
	/// The primary query plus provider-generated variations, normalized and
	/// deduplicated. Provider failure degrades to the primary query alone.
	pub(crate) async fn expanded_queries(
		&self,
		query: &str,
		declared_language: Option<&str>,
	) -> Vec<String> {
		let expansion = &self.cfg.search.expansion;
		let mode = resolve_expansion_mode(&self.cfg);
		let fallback = vec![query.to_string()];

		if !should_expand(mode, declared_language, query) {
			return fallback;
		}

		let messages = build_expansion_messages(query, expansion.max_queries);
		let generated = match self
			.providers
			.generation
			.generate(&self.cfg.providers.generation, &messages)
			.await
		{
			Ok(json) => parse_string_array(&json, "queries"),
			Err(err) => {
				tracing::warn!(error = %err, "Query expansion failed. Using the original query.");

				return fallback;
			},
		};
		let normalized = normalize_queries(
			generated,
			query,
			expansion.include_original,
			expansion.max_queries,
		);

		if normalized.is_empty() { fallback } else { normalized }
	}

	/// Best-effort alternative phrasings for an empty result set. Always
	/// degrades to an empty list rather than an error.
	pub(crate) async fn no_result_suggestions(&self, query: &str) -> Vec<String> {
		let max = self.cfg.search.suggestions.max_suggestions;
		let messages = build_suggestion_messages(query, max);

		match self.providers.generation.generate(&self.cfg.providers.generation, &messages).await {
			Ok(json) => {
				let mut out = parse_string_array(&json, "suggestions");

				out.truncate(max as usize);

				out
			},
			Err(err) => {
				tracing::warn!(error = %err, "Suggestion generation failed.");

				Vec::new()
			},
		}
	}
}

pub(crate) fn normalize_queries(
	queries: Vec<String>,
	original: &str,
	include_original: bool,
	max_queries: u32,
) -> Vec<String> {
	let mut out = Vec::new();
	let mut seen = HashSet::new();

	if include_original {
		push_query(&mut out, &mut seen, original);
	}

	for query in queries {
		if out.len() >= max_queries as usize {
			break;
		}

		push_query(&mut out, &mut seen, &query);
	}

	out.truncate(max_queries as usize);

	out
}

fn push_query(out: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return;
	}

	let key = trimmed.to_lowercase();

	if seen.insert(key) {
		out.push(trimmed.to_string());
	}
}

pub(crate) fn build_expansion_messages(query: &str, max_queries: u32) -> Vec<Value> {
	let schema = serde_json::json!({
		"queries": ["string"]
	});
	let schema_text = serde_json::to_string_pretty(&schema)
		.unwrap_or_else(|_| "{\"queries\": [\"string\"]}".to_string());
	let system_prompt = "You are a query expansion engine for an experience discovery platform. \
Output must be valid JSON only and must match the provided schema exactly. \
Generate short English query variations and translations that preserve the original intent. \
Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n- MAX_QUERIES = {max}\nOriginal query:\n{query}",
		schema = schema_text,
		max = max_queries,
		query = query
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

pub(crate) fn build_suggestion_messages(query: &str, max_suggestions: u32) -> Vec<Value> {
	let schema = serde_json::json!({
		"suggestions": ["string"]
	});
	let schema_text = serde_json::to_string_pretty(&schema)
		.unwrap_or_else(|_| "{\"suggestions\": [\"string\"]}".to_string());
	let system_prompt = "You suggest alternative search phrasings for an experience discovery \
platform when a search returns nothing. Output must be valid JSON only and must match the \
provided schema exactly.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n- MAX_SUGGESTIONS = {max}\nQuery with no results:\n{query}",
		schema = schema_text,
		max = max_suggestions,
		query = query
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn parse_string_array(json: &Value, key: &str) -> Vec<String> {
	json.get(key)
		.and_then(|value| value.as_array())
		.map(|items| {
			items
				.iter()
				.filter_map(|item| item.as_str())
				.map(str::to_string)
				.collect()
		})
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dynamic_mode_skips_english_queries() {
		assert!(!should_expand(
			ExpansionMode::Dynamic,
			None,
			"strange lights hovering over the water all night"
		));
		assert!(should_expand(ExpansionMode::Dynamic, Some("es"), "luces extrañas"));
		assert!(should_expand(ExpansionMode::Always, Some("en"), "strange lights"));
		assert!(!should_expand(ExpansionMode::Off, Some("es"), "luces extrañas"));
	}

	#[test]
	fn normalize_dedupes_case_insensitively_and_caps() {
		let queries = vec![
			"Luces en el cielo".to_string(),
			"lights in the sky".to_string(),
			"LIGHTS IN THE SKY".to_string(),
			"glowing sky".to_string(),
		];
		let normalized = normalize_queries(queries, "luces en el cielo", true, 3);

		assert_eq!(
			normalized,
			vec!["luces en el cielo".to_string(), "lights in the sky".to_string(), "glowing sky".to_string()]
		);
	}

	#[test]
	fn parses_the_expected_json_key() {
		let json = serde_json::json!({ "queries": ["one", "two", 3] });

		assert_eq!(parse_string_array(&json, "queries"), vec!["one", "two"]);
		assert!(parse_string_array(&json, "suggestions").is_empty());
	}
}
