use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ExperienceRow {
	pub experience_id: Uuid,
	pub author_id: Uuid,
	pub title: String,
	pub narrative: String,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub duration: Option<String>,
	pub location_name: Option<String>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub attributes: Value,
	pub language: String,
	pub occurred_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ProfileRow {
	pub author_id: Uuid,
	pub display_name: String,
	pub avatar_url: Option<String>,
}

/// The subset of experience fields facet aggregation reads.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct FacetFieldRow {
	pub category: Option<String>,
	pub location_name: Option<String>,
	pub tags: Vec<String>,
	pub attributes: Value,
	pub occurred_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug)]
pub struct SearchAnalyticsRow {
	pub analytics_id: Uuid,
	pub query: String,
	pub result_count: i32,
	pub execution_time_ms: i64,
	pub vector_weight: f32,
	pub lexical_weight: f32,
	pub search_type: String,
	pub created_at: OffsetDateTime,
}
