use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CATEGORY_WEIGHT: f32 = 0.4;
pub const TAG_WEIGHT: f32 = 0.3;
pub const DURATION_WEIGHT: f32 = 0.1;
pub const NEARBY_WEIGHT: f32 = 0.2;
pub const REGION_WEIGHT: f32 = 0.1;

pub const NEARBY_KM: f64 = 50.0;
pub const REGION_KM: f64 = 200.0;

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Coordinates {
	pub latitude: f64,
	pub longitude: f64,
}

/// The fields of an experience record that participate in similarity
/// scoring. Everything else on the record is irrelevant here.
#[derive(Clone, Debug)]
pub struct Experience {
	pub id: Uuid,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub duration: Option<String>,
	pub coordinates: Option<Coordinates>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimilarityScore {
	pub score: f32,
	pub reasons: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SimilarityMatch {
	pub id: Uuid,
	pub score: f32,
	pub reasons: Vec<String>,
}

/// Great-circle distance in kilometers between two points, via the
/// haversine formula.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
	let lat1 = a.latitude.to_radians();
	let lat2 = b.latitude.to_radians();
	let d_lat = (b.latitude - a.latitude).to_radians();
	let d_lon = (b.longitude - a.longitude).to_radians();
	let h = (d_lat / 2.0).sin().powi(2)
		+ lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

	2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Scores how alike two experiences are across the weighted factor set.
/// Factors are additive; the total is clamped to 1.0.
pub fn score_similarity(source: &Experience, candidate: &Experience) -> SimilarityScore {
	let mut score = 0.0_f32;
	let mut reasons = Vec::new();

	if let (Some(source_category), Some(candidate_category)) =
		(source.category.as_deref(), candidate.category.as_deref())
		&& source_category == candidate_category
	{
		score += CATEGORY_WEIGHT;
		reasons.push("same category".to_string());
	}

	let overlap = tag_overlap(&source.tags, &candidate.tags);

	if overlap.matched > 0 {
		score += TAG_WEIGHT * overlap.ratio;
		reasons.push(format!("{} matching tags", overlap.matched));
	}

	if let (Some(source_duration), Some(candidate_duration)) =
		(source.duration.as_deref(), candidate.duration.as_deref())
		&& source_duration == candidate_duration
	{
		score += DURATION_WEIGHT;
		reasons.push("same duration".to_string());
	}

	if let (Some(source_coords), Some(candidate_coords)) =
		(source.coordinates, candidate.coordinates)
	{
		let distance = haversine_km(source_coords, candidate_coords);

		if distance < NEARBY_KM {
			score += NEARBY_WEIGHT;
			reasons.push("nearby location".to_string());
		} else if distance < REGION_KM {
			score += REGION_WEIGHT;
			reasons.push("same region".to_string());
		}
	}

	SimilarityScore { score: score.min(1.0), reasons }
}

/// Scores the candidate pool against the source, discards candidates at or
/// below `min_score`, and returns the strongest `top_n` matches in
/// descending score order with deterministic id tie-breaking.
pub fn rank_similar(
	source: &Experience,
	pool: &[Experience],
	min_score: f32,
	top_n: usize,
) -> Vec<SimilarityMatch> {
	let mut matches = Vec::new();

	for candidate in pool {
		if candidate.id == source.id {
			continue;
		}

		let scored = score_similarity(source, candidate);

		if scored.score <= min_score {
			continue;
		}

		matches.push(SimilarityMatch {
			id: candidate.id,
			score: scored.score,
			reasons: scored.reasons,
		});
	}

	matches.sort_by(|left, right| {
		cmp_score_desc(left.score, right.score).then_with(|| left.id.cmp(&right.id))
	});
	matches.truncate(top_n);

	matches
}

struct TagOverlap {
	matched: usize,
	ratio: f32,
}

fn tag_overlap(source: &[String], candidate: &[String]) -> TagOverlap {
	if source.is_empty() || candidate.is_empty() {
		return TagOverlap { matched: 0, ratio: 0.0 };
	}

	let source_set: HashSet<&str> = source.iter().map(String::as_str).collect();
	let candidate_set: HashSet<&str> = candidate.iter().map(String::as_str).collect();
	let matched = source_set.intersection(&candidate_set).count();
	let denominator = source_set.len().max(candidate_set.len());

	TagOverlap { matched, ratio: matched as f32 / denominator as f32 }
}

fn cmp_score_desc(a: f32, b: f32) -> Ordering {
	b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn experience(id: u128) -> Experience {
		Experience {
			id: Uuid::from_u128(id),
			category: None,
			tags: Vec::new(),
			duration: None,
			coordinates: None,
		}
	}

	fn full_match_pair() -> (Experience, Experience) {
		let mut source = experience(1);
		let mut candidate = experience(2);

		source.category = Some("sighting".to_string());
		candidate.category = Some("sighting".to_string());
		source.tags = vec!["orb".to_string(), "night".to_string()];
		candidate.tags = vec!["orb".to_string(), "night".to_string()];
		source.duration = Some("minutes".to_string());
		candidate.duration = Some("minutes".to_string());
		source.coordinates = Some(Coordinates { latitude: 46.8, longitude: -92.1 });
		candidate.coordinates = Some(Coordinates { latitude: 46.9, longitude: -92.2 });

		(source, candidate)
	}

	#[test]
	fn identical_coordinates_have_zero_distance() {
		let point = Coordinates { latitude: 44.98, longitude: -93.27 };

		assert_eq!(haversine_km(point, point), 0.0);
	}

	#[test]
	fn distance_is_symmetric() {
		let minneapolis = Coordinates { latitude: 44.98, longitude: -93.27 };
		let duluth = Coordinates { latitude: 46.79, longitude: -92.1 };

		assert!((haversine_km(minneapolis, duluth) - haversine_km(duluth, minneapolis)).abs() < 1e-9);
	}

	#[test]
	fn minneapolis_to_st_paul_is_about_sixteen_km() {
		let minneapolis = Coordinates { latitude: 44.98, longitude: -93.27 };
		let st_paul = Coordinates { latitude: 44.95, longitude: -93.09 };
		let distance = haversine_km(minneapolis, st_paul);

		assert!(distance > 15.0 && distance < 17.0, "distance: {distance}");
	}

	#[test]
	fn full_match_scores_maximum_with_all_reasons() {
		let (source, candidate) = full_match_pair();
		let scored = score_similarity(&source, &candidate);

		assert_eq!(scored.score, 1.0);
		assert_eq!(
			scored.reasons,
			vec!["same category", "2 matching tags", "same duration", "nearby location"]
		);
	}

	#[test]
	fn partial_tag_overlap_scales_by_larger_tag_set() {
		let mut source = experience(1);
		let mut candidate = experience(2);

		source.tags = vec!["orb".to_string(), "night".to_string()];
		candidate.tags =
			vec!["orb".to_string(), "forest".to_string(), "humming".to_string(), "cold".to_string()];

		let scored = score_similarity(&source, &candidate);

		// 1 shared tag over max(2, 4) distinct tags.
		assert!((scored.score - TAG_WEIGHT * 0.25).abs() < 1e-6);
		assert_eq!(scored.reasons, vec!["1 matching tags"]);
	}

	#[test]
	fn region_band_applies_between_fifty_and_two_hundred_km() {
		let mut source = experience(1);
		let mut candidate = experience(2);

		source.coordinates = Some(Coordinates { latitude: 44.98, longitude: -93.27 });
		// Duluth is roughly 220 km from Minneapolis; Saint Cloud about 90 km.
		candidate.coordinates = Some(Coordinates { latitude: 45.56, longitude: -94.16 });

		let scored = score_similarity(&source, &candidate);

		assert_eq!(scored.score, REGION_WEIGHT);
		assert_eq!(scored.reasons, vec!["same region"]);
	}

	#[test]
	fn rank_similar_filters_sorts_and_caps() {
		let (source, strong) = full_match_pair();
		let mut medium = experience(3);
		let mut weak = experience(4);

		medium.category = Some("sighting".to_string());
		weak.tags = vec!["unrelated".to_string()];

		let pool = vec![weak, medium, strong.clone(), source.clone()];
		let ranked = rank_similar(&source, &pool, 0.2, 5);

		assert_eq!(ranked.len(), 2);
		assert_eq!(ranked[0].id, strong.id);
		assert_eq!(ranked[0].score, 1.0);
		assert_eq!(ranked[1].score, CATEGORY_WEIGHT);

		let capped = rank_similar(&source, &pool, 0.2, 1);

		assert_eq!(capped.len(), 1);
	}

	#[test]
	fn scores_at_the_threshold_are_discarded() {
		let source = experience(1);
		let mut candidate = experience(2);

		candidate.coordinates = Some(Coordinates { latitude: 44.98, longitude: -93.27 });

		let ranked = rank_similar(&source, &[candidate], 0.0, 5);

		// No shared factors at all: score 0.0 is not above the threshold.
		assert!(ranked.is_empty());
	}
}
