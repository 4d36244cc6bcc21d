use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub similarity: Similarity,
	#[serde(default)]
	pub limits: Limits,
	#[serde(default)]
	pub facets: Facets,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default)]
	pub bind_localhost_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	pub candidate_k: u32,
	/// Smoothing constant for reciprocal rank fusion. Higher values reduce
	/// the influence of top-ranked entries from any single list.
	pub rrf_k: u32,
	/// The text-search configuration the lexical index was built with.
	pub index_language: String,
	pub expansion: SearchExpansion,
	pub suggestions: SearchSuggestions,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: 20,
			max_limit: 50,
			candidate_k: 100,
			rrf_k: 60,
			index_language: "english".to_string(),
			expansion: SearchExpansion::default(),
			suggestions: SearchSuggestions::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchExpansion {
	pub mode: String,
	pub max_queries: u32,
	pub include_original: bool,
}
impl Default for SearchExpansion {
	fn default() -> Self {
		Self { mode: "dynamic".to_string(), max_queries: 3, include_original: true }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchSuggestions {
	pub enabled: bool,
	pub max_suggestions: u32,
}
impl Default for SearchSuggestions {
	fn default() -> Self {
		Self { enabled: true, max_suggestions: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Similarity {
	/// Candidates scoring at or below this value are discarded.
	pub min_score: f32,
	pub top_n: u32,
	pub candidate_pool: u32,
}
impl Default for Similarity {
	fn default() -> Self {
		Self { min_score: 0.2, top_n: 5, candidate_pool: 200 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Limits {
	pub discovery: RateLimit,
	pub search: RateLimit,
	pub autocomplete: RateLimit,
	pub sweep_interval_secs: u64,
}
impl Default for Limits {
	fn default() -> Self {
		Self {
			discovery: RateLimit { limit: 20, window_secs: 60 },
			search: RateLimit { limit: 60, window_secs: 60 },
			autocomplete: RateLimit { limit: 100, window_secs: 60 },
			sweep_interval_secs: 60,
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimit {
	pub limit: u32,
	pub window_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Facets {
	pub cache_ttl_seconds: u64,
}
impl Default for Facets {
	fn default() -> Self {
		Self { cache_ttl_seconds: 30 }
	}
}
