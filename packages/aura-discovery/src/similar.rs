use std::{collections::HashMap, time::Instant};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	DiscoveryService, Error, Result,
	search::{AuthorProfile, deny_when_limited},
};
use aura_domain::similarity::{self, Coordinates, Experience};
use aura_storage::models::{ExperienceRow, ProfileRow};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimilarRequest {
	pub client_id: String,
	pub experience_id: Uuid,
	pub min_score: Option<f32>,
	pub top_n: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimilarItem {
	pub experience_id: Uuid,
	pub title: String,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub location_name: Option<String>,
	#[serde(with = "crate::time_serde::option")]
	pub occurred_at: Option<OffsetDateTime>,
	pub score: f32,
	pub reasons: Vec<String>,
	pub author: Option<AuthorProfile>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimilarMeta {
	pub execution_time_ms: u64,
	pub candidate_count: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimilarResponse {
	pub items: Vec<SimilarItem>,
	pub meta: SimilarMeta,
}

impl DiscoveryService {
	pub async fn similar(&self, req: SimilarRequest) -> Result<SimilarResponse> {
		let started = Instant::now();
		let client_id = req.client_id.trim();

		if client_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "client_id must be non-empty.".to_string(),
			});
		}
		if let Some(min_score) = req.min_score
			&& (!min_score.is_finite() || !(0.0..=1.0).contains(&min_score))
		{
			return Err(Error::InvalidRequest {
				message: "min_score must be in the range 0.0-1.0.".to_string(),
			});
		}

		deny_when_limited(self.governors.discovery.check(client_id))?;

		let source = self.store.fetch_experience(req.experience_id).await?.ok_or_else(|| {
			Error::NotFound { message: format!("Experience {} does not exist.", req.experience_id) }
		})?;
		let pool = self
			.store
			.fetch_candidate_pool(
				source.experience_id,
				source.category.as_deref(),
				self.cfg.similarity.candidate_pool,
			)
			.await?;
		let min_score = req.min_score.unwrap_or(self.cfg.similarity.min_score);
		let top_n = req.top_n.unwrap_or(self.cfg.similarity.top_n).max(1) as usize;
		let source_signals = similarity_signals(&source);
		let pool_signals: Vec<Experience> = pool.iter().map(similarity_signals).collect();
		let ranked = similarity::rank_similar(&source_signals, &pool_signals, min_score, top_n);
		let by_id: HashMap<Uuid, &ExperienceRow> =
			pool.iter().map(|row| (row.experience_id, row)).collect();
		let author_ids: Vec<Uuid> = {
			let mut out: Vec<Uuid> = ranked
				.iter()
				.filter_map(|entry| by_id.get(&entry.id).map(|row| row.author_id))
				.collect();

			out.sort();
			out.dedup();

			out
		};
		let profiles = self.store.fetch_profiles(&author_ids).await?;
		let profile_by_id: HashMap<Uuid, ProfileRow> =
			profiles.into_iter().map(|profile| (profile.author_id, profile)).collect();
		let mut items = Vec::with_capacity(ranked.len());

		for entry in ranked {
			let Some(row) = by_id.get(&entry.id) else { continue };
			let author = profile_by_id.get(&row.author_id).map(|profile| AuthorProfile {
				author_id: profile.author_id,
				display_name: profile.display_name.clone(),
				avatar_url: profile.avatar_url.clone(),
			});

			items.push(SimilarItem {
				experience_id: row.experience_id,
				title: row.title.clone(),
				category: row.category.clone(),
				tags: row.tags.clone(),
				location_name: row.location_name.clone(),
				occurred_at: row.occurred_at,
				score: entry.score,
				reasons: entry.reasons,
				author,
			});
		}

		Ok(SimilarResponse {
			items,
			meta: SimilarMeta {
				execution_time_ms: started.elapsed().as_millis() as u64,
				candidate_count: pool.len() as u32,
			},
		})
	}
}

fn similarity_signals(row: &ExperienceRow) -> Experience {
	let coordinates = match (row.latitude, row.longitude) {
		(Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
		_ => None,
	};

	Experience {
		id: row.experience_id,
		category: row.category.clone(),
		tags: row.tags.clone(),
		duration: row.duration.clone(),
		coordinates,
	}
}
