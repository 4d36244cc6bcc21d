use std::{
	cmp::Ordering,
	collections::HashMap,
	time::Instant,
};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{DiscoveryService, Error, Result, analytics};
use aura_domain::{intent, ratelimit::RateDecision};
use aura_storage::models::{ExperienceRow, ProfileRow, SearchAnalyticsRow};

const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub client_id: String,
	pub query: String,
	pub language: Option<String>,
	pub category: Option<String>,
	/// Explicit vector-weight override in [0, 1]; the lexical weight is its
	/// complement. When absent the intent classifier picks the split.
	pub vector_weight: Option<f32>,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
	pub vector: f32,
	pub lexical: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
	pub experience_id: Uuid,
	pub vector_rank: Option<u32>,
	pub lexical_rank: Option<u32>,
	pub score: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthorProfile {
	pub author_id: Uuid,
	pub display_name: String,
	pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResultItem {
	pub experience_id: Uuid,
	pub title: String,
	pub snippet: String,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub location_name: Option<String>,
	#[serde(with = "crate::time_serde::option")]
	pub occurred_at: Option<OffsetDateTime>,
	pub score: f32,
	pub vector_rank: Option<u32>,
	pub lexical_rank: Option<u32>,
	pub author: Option<AuthorProfile>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchMeta {
	pub execution_time_ms: u64,
	pub vector_weight: f32,
	pub lexical_weight: f32,
	pub search_type: String,
	pub expanded_queries: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub items: Vec<SearchResultItem>,
	pub suggestions: Vec<String>,
	pub meta: SearchMeta,
}

impl DiscoveryService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let started = Instant::now();
		let client_id = req.client_id.trim();
		let query = req.query.trim().to_string();

		if client_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "client_id must be non-empty.".to_string(),
			});
		}
		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}
		if let Some(weight) = req.vector_weight
			&& (!weight.is_finite() || !(0.0..=1.0).contains(&weight))
		{
			return Err(Error::InvalidRequest {
				message: "vector_weight must be in the range 0.0-1.0.".to_string(),
			});
		}

		deny_when_limited(self.governors.search.check(client_id))?;

		let intent = intent::classify(&query);
		let (mut weights, search_type) = match req.vector_weight {
			Some(weight) =>
				(FusionWeights { vector: weight, lexical: 1.0 - weight }, "custom".to_string()),
			None => (
				FusionWeights { vector: intent.vector_weight, lexical: intent.lexical_weight },
				intent.search_type().to_string(),
			),
		};
		let limit =
			req.limit.unwrap_or(self.cfg.search.default_limit).clamp(1, self.cfg.search.max_limit);
		let candidate_k = self.cfg.search.candidate_k;
		let category = req.category.as_deref();
		let queries = self.expanded_queries(&query, req.language.as_deref()).await;

		let embedding = if weights.vector > 0.0 {
			match self.providers.embedding.embed(&self.cfg.providers.embedding, &query).await {
				Ok(vector) => Some(vector),
				Err(err) => {
					tracing::warn!(
						error = %err,
						"Embedding provider failed. Falling back to lexical-only ranking."
					);

					weights = FusionWeights { vector: 0.0, lexical: 1.0 };

					None
				},
			}
		} else {
			None
		};
		let vector_ids = match embedding.as_deref() {
			Some(vector) =>
				self.store.ranked_vector_ids(vector, category, candidate_k).await?,
			None => Vec::new(),
		};
		let mut lexical_lists = Vec::with_capacity(queries.len());

		for candidate_query in &queries {
			lexical_lists.push(
				self.store
					.ranked_lexical_ids(
						candidate_query,
						&self.cfg.search.index_language,
						category,
						candidate_k,
					)
					.await?,
			);
		}

		let lexical_ids = merge_ranked_lists(&lexical_lists);
		let fused =
			rrf_fuse(&vector_ids, &lexical_ids, weights, self.cfg.search.rrf_k, limit as usize);
		let items = self.enrich(&fused).await?;
		let suggestions = if items.is_empty() && self.cfg.search.suggestions.enabled {
			self.no_result_suggestions(&query).await
		} else {
			Vec::new()
		};
		let execution_time_ms = started.elapsed().as_millis() as u64;

		analytics::record(
			&self.store,
			SearchAnalyticsRow {
				analytics_id: Uuid::new_v4(),
				query: query.clone(),
				result_count: items.len() as i32,
				execution_time_ms: execution_time_ms as i64,
				vector_weight: weights.vector,
				lexical_weight: weights.lexical,
				search_type: search_type.clone(),
				created_at: OffsetDateTime::now_utc(),
			},
		);

		Ok(SearchResponse {
			items,
			suggestions,
			meta: SearchMeta {
				execution_time_ms,
				vector_weight: weights.vector,
				lexical_weight: weights.lexical,
				search_type,
				expanded_queries: queries,
			},
		})
	}

	async fn enrich(&self, fused: &[RankedCandidate]) -> Result<Vec<SearchResultItem>> {
		if fused.is_empty() {
			return Ok(Vec::new());
		}

		let ids: Vec<Uuid> = fused.iter().map(|candidate| candidate.experience_id).collect();
		let rows = self.store.fetch_experiences(&ids).await?;
		let mut by_id: HashMap<Uuid, ExperienceRow> =
			rows.into_iter().map(|row| (row.experience_id, row)).collect();
		let author_ids: Vec<Uuid> = {
			let mut out: Vec<Uuid> = by_id.values().map(|row| row.author_id).collect();

			out.sort();
			out.dedup();

			out
		};
		let profiles = self.store.fetch_profiles(&author_ids).await?;
		let profile_by_id: HashMap<Uuid, ProfileRow> =
			profiles.into_iter().map(|profile| (profile.author_id, profile)).collect();
		let mut items = Vec::with_capacity(fused.len());

		// Enrichment joins metadata onto the fused ordering; it must never
		// reorder it.
		for candidate in fused {
			let Some(row) = by_id.remove(&candidate.experience_id) else {
				tracing::warn!(
					experience_id = %candidate.experience_id,
					"Fused candidate missing from the record store."
				);

				continue;
			};
			let author = profile_by_id.get(&row.author_id).map(|profile| AuthorProfile {
				author_id: profile.author_id,
				display_name: profile.display_name.clone(),
				avatar_url: profile.avatar_url.clone(),
			});

			items.push(SearchResultItem {
				experience_id: row.experience_id,
				title: row.title,
				snippet: make_snippet(&row.narrative),
				category: row.category,
				tags: row.tags,
				location_name: row.location_name,
				occurred_at: row.occurred_at,
				score: candidate.score,
				vector_rank: candidate.vector_rank,
				lexical_rank: candidate.lexical_rank,
				author,
			});
		}

		Ok(items)
	}
}

pub(crate) fn deny_when_limited(decision: RateDecision) -> Result<()> {
	if decision.allowed {
		return Ok(());
	}

	Err(Error::RateLimited { remaining: decision.remaining, reset_at: decision.reset_at })
}

/// Reciprocal rank fusion over the two ranked id lists. Ranks are
/// 1-indexed; a candidate absent from a list contributes nothing for that
/// term. Output is sorted by fused score descending with deterministic
/// tie-breaking (vector rank, then lexical rank, then id) and truncated to
/// `limit`.
pub fn rrf_fuse(
	vector: &[Uuid],
	lexical: &[Uuid],
	weights: FusionWeights,
	k: u32,
	limit: usize,
) -> Vec<RankedCandidate> {
	let mut ranks: HashMap<Uuid, (Option<u32>, Option<u32>)> = HashMap::new();

	for (idx, id) in vector.iter().enumerate() {
		let entry = ranks.entry(*id).or_insert((None, None));

		if entry.0.is_none() {
			entry.0 = Some(idx as u32 + 1);
		}
	}
	for (idx, id) in lexical.iter().enumerate() {
		let entry = ranks.entry(*id).or_insert((None, None));

		if entry.1.is_none() {
			entry.1 = Some(idx as u32 + 1);
		}
	}

	let mut fused: Vec<RankedCandidate> = ranks
		.into_iter()
		.map(|(experience_id, (vector_rank, lexical_rank))| {
			let vector_term =
				vector_rank.map(|rank| weights.vector / (k + rank) as f32).unwrap_or(0.0);
			let lexical_term =
				lexical_rank.map(|rank| weights.lexical / (k + rank) as f32).unwrap_or(0.0);

			RankedCandidate {
				experience_id,
				vector_rank,
				lexical_rank,
				score: vector_term + lexical_term,
			}
		})
		.collect();

	fused.sort_by(|left, right| {
		cmp_f32_desc(left.score, right.score)
			.then_with(|| rank_asc(left.vector_rank, right.vector_rank))
			.then_with(|| rank_asc(left.lexical_rank, right.lexical_rank))
			.then_with(|| left.experience_id.cmp(&right.experience_id))
	});
	fused.truncate(limit);

	fused
}

/// Collapses per-query ranked lists into one list, keeping each id's best
/// rank across lists.
pub(crate) fn merge_ranked_lists(lists: &[Vec<Uuid>]) -> Vec<Uuid> {
	let mut best: HashMap<Uuid, u32> = HashMap::new();

	for list in lists {
		for (idx, id) in list.iter().enumerate() {
			let rank = idx as u32 + 1;
			let entry = best.entry(*id).or_insert(rank);

			*entry = (*entry).min(rank);
		}
	}

	let mut merged: Vec<(Uuid, u32)> = best.into_iter().collect();

	merged.sort_by(|left, right| left.1.cmp(&right.1).then_with(|| left.0.cmp(&right.0)));

	merged.into_iter().map(|(id, _)| id).collect()
}

pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

pub(crate) fn rank_asc(left: Option<u32>, right: Option<u32>) -> Ordering {
	let lhs = left.unwrap_or(u32::MAX);
	let rhs = right.unwrap_or(u32::MAX);

	lhs.cmp(&rhs)
}

fn make_snippet(narrative: &str) -> String {
	let trimmed = narrative.trim();

	if trimmed.chars().count() <= SNIPPET_CHARS {
		return trimmed.to_string();
	}

	let mut out: String = trimmed.chars().take(SNIPPET_CHARS).collect();

	out.push('…');

	out
}
