pub mod analytics;
pub mod autocomplete;
pub mod expansion;
pub mod facets;
pub mod search;
pub mod similar;
pub mod time_serde;

mod error;

pub use autocomplete::{AutocompleteRequest, AutocompleteResponse};
pub use error::{Error, Result};
pub use facets::{FacetsMeta, FacetsRequest, FacetsResponse};
pub use search::{
	AuthorProfile, FusionWeights, RankedCandidate, SearchMeta, SearchRequest, SearchResponse,
	SearchResultItem, rrf_fuse,
};
pub use similar::{SimilarItem, SimilarMeta, SimilarRequest, SimilarResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use time::Duration;
use uuid::Uuid;

use aura_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use aura_domain::ratelimit::RateGovernor;
use aura_storage::{
	db::Db,
	models::{ExperienceRow, FacetFieldRow, ProfileRow, SearchAnalyticsRow},
	queries,
};
use crate::facets::FacetCache;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type StoreResult<T> = aura_storage::Result<T>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, aura_providers::Result<Vec<f32>>>;
}

pub trait GenerateProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, aura_providers::Result<Value>>;
}

/// The datastore surface discovery needs. The production implementation is
/// Postgres-backed; tests substitute in-memory stores.
pub trait SearchStore
where
	Self: Send + Sync,
{
	fn ranked_vector_ids<'a>(
		&'a self,
		embedding: &'a [f32],
		category: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<Uuid>>>;

	fn ranked_lexical_ids<'a>(
		&'a self,
		query: &'a str,
		language: &'a str,
		category: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<Uuid>>>;

	fn fetch_experiences<'a>(&'a self, ids: &'a [Uuid])
	-> BoxFuture<'a, StoreResult<Vec<ExperienceRow>>>;

	fn fetch_experience<'a>(&'a self, id: Uuid)
	-> BoxFuture<'a, StoreResult<Option<ExperienceRow>>>;

	fn fetch_profiles<'a>(
		&'a self,
		author_ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<ProfileRow>>>;

	fn fetch_candidate_pool<'a>(
		&'a self,
		source_id: Uuid,
		category: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<ExperienceRow>>>;

	fn fetch_facet_rows<'a>(
		&'a self,
		category: Option<&'a str>,
		location: Option<&'a str>,
		tags: Option<&'a [String]>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<FacetFieldRow>>>;

	fn autocomplete_terms<'a>(
		&'a self,
		prefix: &'a str,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<String>>>;

	fn record_search<'a>(
		&'a self,
		record: &'a SearchAnalyticsRow,
	) -> BoxFuture<'a, StoreResult<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerateProvider>,
}

/// One governor per endpoint class; each is an independent counter, not a
/// shared budget.
pub struct Governors {
	pub discovery: RateGovernor,
	pub search: RateGovernor,
	pub autocomplete: RateGovernor,
}
impl Governors {
	fn from_config(limits: &aura_config::Limits) -> Self {
		Self {
			discovery: governor(&limits.discovery),
			search: governor(&limits.search),
			autocomplete: governor(&limits.autocomplete),
		}
	}
}

fn governor(limit: &aura_config::RateLimit) -> RateGovernor {
	RateGovernor::new(limit.limit, Duration::seconds(limit.window_secs as i64))
}

pub struct DiscoveryService {
	pub cfg: Config,
	pub(crate) store: Arc<dyn SearchStore>,
	pub(crate) providers: Providers,
	pub(crate) governors: Governors,
	pub(crate) facet_cache: FacetCache,
}
impl DiscoveryService {
	pub fn new(cfg: Config, store: Arc<dyn SearchStore>, providers: Providers) -> Self {
		let governors = Governors::from_config(&cfg.limits);
		let facet_cache = FacetCache::new(cfg.facets.cache_ttl_seconds);

		Self { cfg, store, providers, governors, facet_cache }
	}

	/// Drops elapsed rate records across every endpoint class. The API app
	/// calls this from its periodic sweep task.
	pub fn sweep_rate_records(&self) -> usize {
		self.governors.discovery.sweep()
			+ self.governors.search.sweep()
			+ self.governors.autocomplete.sweep()
	}
}

pub fn default_providers() -> Providers {
	Providers { embedding: Arc::new(DefaultProviders), generation: Arc::new(DefaultProviders) }
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, aura_providers::Result<Vec<f32>>> {
		Box::pin(async move {
			let mut vectors =
				aura_providers::embedding::embed(cfg, &[text.to_string()]).await?;

			vectors.pop().ok_or_else(|| aura_providers::Error::InvalidResponse {
				message: "Embedding response contained no vectors.".to_string(),
			})
		})
	}
}
impl GenerateProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, aura_providers::Result<Value>> {
		Box::pin(aura_providers::generate::generate(cfg, messages))
	}
}

/// Postgres-backed [`SearchStore`] delegating to `aura_storage::queries`.
pub struct PgStore {
	db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl SearchStore for PgStore {
	fn ranked_vector_ids<'a>(
		&'a self,
		embedding: &'a [f32],
		category: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<Uuid>>> {
		Box::pin(queries::ranked_vector_ids(&self.db, embedding, category, limit))
	}

	fn ranked_lexical_ids<'a>(
		&'a self,
		query: &'a str,
		language: &'a str,
		category: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<Uuid>>> {
		Box::pin(queries::ranked_lexical_ids(&self.db, query, language, category, limit))
	}

	fn fetch_experiences<'a>(
		&'a self,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<ExperienceRow>>> {
		Box::pin(queries::fetch_experiences(&self.db, ids))
	}

	fn fetch_experience<'a>(
		&'a self,
		id: Uuid,
	) -> BoxFuture<'a, StoreResult<Option<ExperienceRow>>> {
		Box::pin(queries::fetch_experience(&self.db, id))
	}

	fn fetch_profiles<'a>(
		&'a self,
		author_ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<ProfileRow>>> {
		Box::pin(queries::fetch_profiles(&self.db, author_ids))
	}

	fn fetch_candidate_pool<'a>(
		&'a self,
		source_id: Uuid,
		category: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<ExperienceRow>>> {
		Box::pin(queries::fetch_candidate_pool(&self.db, source_id, category, limit))
	}

	fn fetch_facet_rows<'a>(
		&'a self,
		category: Option<&'a str>,
		location: Option<&'a str>,
		tags: Option<&'a [String]>,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<FacetFieldRow>>> {
		Box::pin(queries::fetch_facet_rows(&self.db, category, location, tags, limit))
	}

	fn autocomplete_terms<'a>(
		&'a self,
		prefix: &'a str,
		limit: u32,
	) -> BoxFuture<'a, StoreResult<Vec<String>>> {
		Box::pin(queries::autocomplete_terms(&self.db, prefix, limit))
	}

	fn record_search<'a>(
		&'a self,
		record: &'a SearchAnalyticsRow,
	) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(queries::insert_analytics(&self.db, record))
	}
}
