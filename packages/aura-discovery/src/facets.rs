use std::{
	collections::HashMap,
	sync::Mutex,
	time::{Duration, Instant},
};

use time::OffsetDateTime;

use crate::{DiscoveryService, Error, Result, search::deny_when_limited};
use aura_domain::facets::{self, FacetCounts, FacetRow};
use aura_storage::models::FacetFieldRow;

// Upper bound on how many rows one aggregation pass reads.
const FACET_SCAN_LIMIT: u32 = 5_000;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FacetsRequest {
	pub client_id: String,
	pub category: Option<String>,
	pub location: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FacetsMeta {
	pub execution_time_ms: u64,
	pub cached: bool,
	pub row_count: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FacetsResponse {
	pub facets: FacetCounts,
	pub meta: FacetsMeta,
}

struct CacheEntry {
	computed_at: Instant,
	facets: FacetCounts,
	row_count: u32,
}

/// Short-TTL cache of computed facet counts, keyed by a hash of the filter
/// context. Entries never outlive the TTL; stale entries are dropped
/// whenever a fresh one is inserted.
pub(crate) struct FacetCache {
	ttl: Duration,
	entries: Mutex<HashMap<String, CacheEntry>>,
}
impl FacetCache {
	pub(crate) fn new(ttl_seconds: u64) -> Self {
		Self { ttl: Duration::from_secs(ttl_seconds), entries: Mutex::new(HashMap::new()) }
	}

	fn get(&self, key: &str) -> Option<(FacetCounts, u32)> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let entry = entries.get(key)?;

		if entry.computed_at.elapsed() >= self.ttl {
			return None;
		}

		Some((entry.facets.clone(), entry.row_count))
	}

	fn insert(&self, key: String, facets: FacetCounts, row_count: u32) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let ttl = self.ttl;

		entries.retain(|_, entry| entry.computed_at.elapsed() < ttl);
		entries.insert(key, CacheEntry { computed_at: Instant::now(), facets, row_count });
	}
}

impl DiscoveryService {
	pub async fn facets(&self, req: FacetsRequest) -> Result<FacetsResponse> {
		let started = Instant::now();
		let client_id = req.client_id.trim();

		if client_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "client_id must be non-empty.".to_string(),
			});
		}

		deny_when_limited(self.governors.search.check(client_id))?;

		let key = cache_key(&req);

		if let Some((facets, row_count)) = self.facet_cache.get(&key) {
			return Ok(FacetsResponse {
				facets,
				meta: FacetsMeta {
					execution_time_ms: started.elapsed().as_millis() as u64,
					cached: true,
					row_count,
				},
			});
		}

		let tags = if req.tags.is_empty() { None } else { Some(req.tags.as_slice()) };
		let rows = self
			.store
			.fetch_facet_rows(req.category.as_deref(), req.location.as_deref(), tags, FACET_SCAN_LIMIT)
			.await?;
		let facet_rows: Vec<FacetRow> = rows.into_iter().map(facet_row).collect();
		let facets = facets::aggregate(&facet_rows, OffsetDateTime::now_utc());
		let row_count = facet_rows.len() as u32;

		self.facet_cache.insert(key, facets.clone(), row_count);

		Ok(FacetsResponse {
			facets,
			meta: FacetsMeta {
				execution_time_ms: started.elapsed().as_millis() as u64,
				cached: false,
				row_count,
			},
		})
	}
}

fn cache_key(req: &FacetsRequest) -> String {
	let payload = serde_json::json!({
		"category": req.category,
		"location": req.location,
		"tags": req.tags,
	});
	let raw = serde_json::to_vec(&payload).unwrap_or_default();

	blake3::hash(&raw).to_hex().to_string()
}

fn facet_row(row: FacetFieldRow) -> FacetRow {
	FacetRow {
		category: row.category,
		location: row.location_name,
		tags: row.tags,
		attributes: row.attributes,
		occurred_at: row.occurred_at,
	}
}
