use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use aura_domain::{facets, intent, ratelimit::RateGovernor, similarity};

#[test]
fn keyword_and_question_weights_disagree() {
	let keyword = intent::classify("black triangle");
	let question = intent::classify("what was the black triangle I saw?");

	assert!(keyword.is_keyword);
	assert!(question.is_question);
	assert!(question.vector_weight > keyword.vector_weight);
	assert_eq!(keyword.vector_weight + keyword.lexical_weight, 1.0);
	assert_eq!(question.vector_weight + question.lexical_weight, 1.0);
}

#[test]
fn three_word_statement_is_keyword_not_natural_language() {
	let result = intent::classify("cold spot basement");

	assert!(result.is_keyword);
	assert!(!result.is_natural_language);
	assert!(!result.is_question);
}

#[test]
fn similar_experiences_near_the_source_outrank_distant_ones() {
	let source = similarity::Experience {
		id: Uuid::from_u128(1),
		category: Some("sighting".to_string()),
		tags: vec!["orb".to_string()],
		duration: None,
		coordinates: Some(similarity::Coordinates { latitude: 46.78, longitude: -92.1 }),
	};
	let near = similarity::Experience {
		id: Uuid::from_u128(2),
		category: Some("sighting".to_string()),
		tags: vec!["orb".to_string()],
		duration: None,
		coordinates: Some(similarity::Coordinates { latitude: 46.72, longitude: -92.2 }),
	};
	let far = similarity::Experience {
		id: Uuid::from_u128(3),
		category: Some("sighting".to_string()),
		tags: vec!["orb".to_string()],
		duration: None,
		coordinates: Some(similarity::Coordinates { latitude: 25.76, longitude: -80.19 }),
	};
	let ranked = similarity::rank_similar(&source, &[far, near], 0.2, 5);

	assert_eq!(ranked.len(), 2);
	assert_eq!(ranked[0].id, Uuid::from_u128(2));
	assert!(ranked[0].score > ranked[1].score);
	assert!(ranked[0].reasons.contains(&"nearby location".to_string()));
}

#[test]
fn governor_and_facets_share_a_consistent_clock_model() {
	let governor = RateGovernor::new(2, Duration::seconds(60));
	let now = OffsetDateTime::now_utc();

	assert!(governor.check_at("key", now).allowed);
	assert!(governor.check_at("key", now).allowed);
	assert!(!governor.check_at("key", now).allowed);

	let rows = vec![facets::FacetRow {
		category: Some("sighting".to_string()),
		location: None,
		tags: Vec::new(),
		attributes: serde_json::Value::Null,
		occurred_at: Some(now - Duration::days(30)),
	}];
	let counts = facets::aggregate(&rows, now);

	assert_eq!(counts.date_buckets.within_30_days, 1);
	assert_eq!(counts.categories.get("sighting"), Some(&1));
}
