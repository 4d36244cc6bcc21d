use toml::Value;

use aura_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_config() -> Config {
	parse(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
}

fn parse(raw: String) -> Config {
	toml::from_str(&raw).expect("Failed to parse sample config.")
}

fn sample_with<F>(mutate: F) -> Config
where
	F: FnOnce(&mut toml::Table),
{
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let root = value.as_table_mut().expect("Template config must be a table.");

	mutate(root);

	parse(toml::to_string(&value).expect("Failed to render template config."))
}

fn table_mut<'a>(root: &'a mut toml::Table, path: &[&str]) -> &'a mut toml::Table {
	let mut current = root;

	for key in path {
		current = current
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	current
}

#[test]
fn sample_config_is_valid() {
	let cfg = sample_config();

	aura_config::validate(&cfg).expect("Sample config should validate.");
}

#[test]
fn rejects_zero_embedding_dimensions() {
	let cfg = sample_with(|root| {
		table_mut(root, &["providers", "embedding"])
			.insert("dimensions".to_string(), Value::Integer(0));
	});
	let err = aura_config::validate(&cfg).expect_err("Expected validation failure.");

	assert!(matches!(err, Error::Validation { message } if message.contains("dimensions")));
}

#[test]
fn rejects_unknown_expansion_mode() {
	let cfg = sample_with(|root| {
		table_mut(root, &["search", "expansion"])
			.insert("mode".to_string(), Value::String("sometimes".to_string()));
	});

	assert!(aura_config::validate(&cfg).is_err());
}

#[test]
fn rejects_min_score_out_of_range() {
	let cfg = sample_with(|root| {
		table_mut(root, &["similarity"]).insert("min_score".to_string(), Value::Float(1.5));
	});

	assert!(aura_config::validate(&cfg).is_err());
}

#[test]
fn rejects_zero_rate_limit() {
	let cfg = sample_with(|root| {
		table_mut(root, &["limits", "search"]).insert("limit".to_string(), Value::Integer(0));
	});
	let err = aura_config::validate(&cfg).expect_err("Expected validation failure.");

	assert!(matches!(err, Error::Validation { message } if message.contains("limits.search")));
}

#[test]
fn rejects_candidate_k_below_max_limit() {
	let cfg = sample_with(|root| {
		table_mut(root, &["search"]).insert("candidate_k".to_string(), Value::Integer(10));
	});

	assert!(aura_config::validate(&cfg).is_err());
}

#[test]
fn defaults_fill_optional_sections() {
	let cfg = sample_with(|root| {
		root.remove("search");
		root.remove("similarity");
		root.remove("limits");
		root.remove("facets");
	});

	assert_eq!(cfg.search.rrf_k, 60);
	assert_eq!(cfg.similarity.top_n, 5);
	assert_eq!(cfg.limits.discovery.limit, 20);
	assert_eq!(cfg.limits.search.limit, 60);
	assert_eq!(cfg.limits.autocomplete.limit, 100);
	assert_eq!(cfg.facets.cache_ttl_seconds, 30);

	aura_config::validate(&cfg).expect("Defaults should validate.");
}

#[test]
fn load_normalizes_index_language_case() {
	let raw = toml::to_string(&{
		let mut value: Value =
			toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

		table_mut(value.as_table_mut().expect("Template config must be a table."), &["search"])
			.insert("index_language".to_string(), Value::String("English".to_string()));

		value
	})
	.expect("Failed to render template config.");
	let dir = std::env::temp_dir().join(format!("aura-config-test-{}", std::process::id()));

	std::fs::create_dir_all(&dir).expect("Failed to create temp dir.");

	let path = dir.join("config.toml");

	std::fs::write(&path, raw).expect("Failed to write config.");

	let cfg = aura_config::load(&path).expect("Failed to load config.");

	assert_eq!(cfg.search.index_language, "english");

	let _ = std::fs::remove_dir_all(&dir);
}
