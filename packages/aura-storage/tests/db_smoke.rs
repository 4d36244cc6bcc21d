use time::OffsetDateTime;
use uuid::Uuid;

use aura_config::Postgres;
use aura_storage::{
	db::Db,
	models::{ExperienceRow, ProfileRow},
	queries,
};
use aura_testkit::TestDatabase;

fn sample_experience(author_id: Uuid, title: &str, narrative: &str) -> ExperienceRow {
	ExperienceRow {
		experience_id: Uuid::new_v4(),
		author_id,
		title: title.to_string(),
		narrative: narrative.to_string(),
		category: Some("sighting".to_string()),
		tags: vec!["orb".to_string(), "night".to_string()],
		duration: Some("minutes".to_string()),
		location_name: Some("Duluth".to_string()),
		latitude: Some(46.78),
		longitude: Some(-92.1),
		attributes: serde_json::json!({ "witness_count": 1 }),
		language: "en".to_string(),
		occurred_at: Some(OffsetDateTime::now_utc()),
		created_at: OffsetDateTime::now_utc(),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set AURA_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = aura_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set AURA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(4).await.expect("Failed to ensure schema.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'experiences'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set AURA_PG_DSN to run."]
async fn ranked_queries_and_lookups_round_trip() {
	let Some(base_dsn) = aura_testkit::env_dsn() else {
		eprintln!("Skipping ranked_queries_and_lookups_round_trip; set AURA_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(4).await.expect("Failed to ensure schema.");

	let author = ProfileRow {
		author_id: Uuid::new_v4(),
		display_name: "Skywatcher".to_string(),
		avatar_url: None,
	};

	queries::insert_profile(&db, &author).await.expect("Failed to insert profile.");

	let lake = sample_experience(
		author.author_id,
		"Lights over the lake",
		"Two orbs hovered above the water.",
	);
	let forest = sample_experience(
		author.author_id,
		"Humming in the forest",
		"A low hum moved through the trees.",
	);

	queries::insert_experience(&db, &lake, Some(&[1.0, 0.0, 0.0, 0.0]))
		.await
		.expect("Failed to insert experience.");
	queries::insert_experience(&db, &forest, Some(&[0.0, 1.0, 0.0, 0.0]))
		.await
		.expect("Failed to insert experience.");

	let vector_ids = queries::ranked_vector_ids(&db, &[1.0, 0.0, 0.0, 0.0], None, 10)
		.await
		.expect("Vector ranking failed.");

	assert_eq!(vector_ids.len(), 2);
	assert_eq!(vector_ids.first(), Some(&lake.experience_id));

	let lexical_ids = queries::ranked_lexical_ids(&db, "lake orbs", "english", None, 10)
		.await
		.expect("Lexical ranking failed.");

	assert_eq!(lexical_ids, vec![lake.experience_id]);

	let filtered = queries::ranked_lexical_ids(&db, "hum", "english", Some("haunting"), 10)
		.await
		.expect("Lexical ranking failed.");

	assert!(filtered.is_empty());

	let fetched =
		queries::fetch_experiences(&db, &vector_ids).await.expect("Fetch experiences failed.");

	assert_eq!(fetched.len(), 2);

	let profiles =
		queries::fetch_profiles(&db, &[author.author_id]).await.expect("Fetch profiles failed.");

	assert_eq!(profiles.len(), 1);
	assert_eq!(profiles[0].display_name, "Skywatcher");

	let pool =
		queries::fetch_candidate_pool(&db, lake.experience_id, lake.category.as_deref(), 10)
			.await
			.expect("Candidate pool failed.");

	assert_eq!(pool.len(), 1);
	assert_eq!(pool[0].experience_id, forest.experience_id);

	let facet_rows = queries::fetch_facet_rows(&db, Some("sighting"), None, None, 100)
		.await
		.expect("Facet rows failed.");

	assert_eq!(facet_rows.len(), 2);

	let terms = queries::autocomplete_terms(&db, "light", 10).await.expect("Autocomplete failed.");

	assert_eq!(terms, vec!["Lights over the lake".to_string()]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
