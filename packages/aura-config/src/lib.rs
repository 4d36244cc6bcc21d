mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Facets, GenerationProviderConfig, Limits, Postgres, Providers,
	RateLimit, Search, SearchExpansion, SearchSuggestions, Service, Similarity, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("generation", &cfg.providers.generation.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit < cfg.search.default_limit {
		return Err(Error::Validation {
			message: "search.max_limit must be at least search.default_limit.".to_string(),
		});
	}
	if cfg.search.candidate_k < cfg.search.max_limit {
		return Err(Error::Validation {
			message: "search.candidate_k must be at least search.max_limit.".to_string(),
		});
	}
	if cfg.search.rrf_k == 0 {
		return Err(Error::Validation {
			message: "search.rrf_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.index_language.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.index_language must be non-empty.".to_string(),
		});
	}
	if !matches!(cfg.search.expansion.mode.as_str(), "off" | "always" | "dynamic") {
		return Err(Error::Validation {
			message: "search.expansion.mode must be one of off, always, or dynamic.".to_string(),
		});
	}
	if cfg.search.expansion.max_queries == 0 {
		return Err(Error::Validation {
			message: "search.expansion.max_queries must be greater than zero.".to_string(),
		});
	}
	if cfg.search.suggestions.enabled && cfg.search.suggestions.max_suggestions == 0 {
		return Err(Error::Validation {
			message: "search.suggestions.max_suggestions must be greater than zero when enabled."
				.to_string(),
		});
	}
	if !cfg.similarity.min_score.is_finite() {
		return Err(Error::Validation {
			message: "similarity.min_score must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.similarity.min_score) {
		return Err(Error::Validation {
			message: "similarity.min_score must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.similarity.top_n == 0 {
		return Err(Error::Validation {
			message: "similarity.top_n must be greater than zero.".to_string(),
		});
	}
	if cfg.similarity.candidate_pool < cfg.similarity.top_n {
		return Err(Error::Validation {
			message: "similarity.candidate_pool must be at least similarity.top_n.".to_string(),
		});
	}

	for (label, limit) in [
		("limits.discovery", &cfg.limits.discovery),
		("limits.search", &cfg.limits.search),
		("limits.autocomplete", &cfg.limits.autocomplete),
	] {
		if limit.limit == 0 {
			return Err(Error::Validation {
				message: format!("{label}.limit must be greater than zero."),
			});
		}
		if limit.window_secs == 0 {
			return Err(Error::Validation {
				message: format!("{label}.window_secs must be greater than zero."),
			});
		}
	}

	if cfg.limits.sweep_interval_secs == 0 {
		return Err(Error::Validation {
			message: "limits.sweep_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.facets.cache_ttl_seconds == 0 {
		return Err(Error::Validation {
			message: "facets.cache_ttl_seconds must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let language = cfg.search.index_language.trim().to_ascii_lowercase();

	if !language.is_empty() {
		cfg.search.index_language = language;
	}

	cfg.search.expansion.mode = cfg.search.expansion.mode.trim().to_ascii_lowercase();
}
