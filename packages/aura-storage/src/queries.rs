use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{ExperienceRow, FacetFieldRow, ProfileRow, SearchAnalyticsRow},
};

const EXPERIENCE_COLUMNS: &str = "\
experience_id,
	author_id,
	title,
	narrative,
	category,
	tags,
	duration,
	location_name,
	latitude,
	longitude,
	attributes,
	language,
	occurred_at,
	created_at";

/// Experience ids ordered by embedding distance to the query vector,
/// nearest first. The caller derives ranks from list positions.
pub async fn ranked_vector_ids(
	db: &Db,
	embedding: &[f32],
	category: Option<&str>,
	limit: u32,
) -> Result<Vec<Uuid>> {
	let vec_text = format_vector_text(embedding);
	let rows: Vec<(Uuid,)> = sqlx::query_as(
		"\
SELECT experience_id
FROM experiences
WHERE embedding IS NOT NULL
	AND ($2::text IS NULL OR category = $2)
ORDER BY embedding <=> $1::text::vector
LIMIT $3",
	)
	.bind(vec_text)
	.bind(category)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Experience ids ordered by full-text relevance, best first.
pub async fn ranked_lexical_ids(
	db: &Db,
	query: &str,
	language: &str,
	category: Option<&str>,
	limit: u32,
) -> Result<Vec<Uuid>> {
	let rows: Vec<(Uuid,)> = sqlx::query_as(
		"\
SELECT experience_id
FROM experiences
WHERE search_tsv @@ websearch_to_tsquery($1::regconfig, $2)
	AND ($3::text IS NULL OR category = $3)
ORDER BY ts_rank_cd(search_tsv, websearch_to_tsquery($1::regconfig, $2)) DESC, experience_id
LIMIT $4",
	)
	.bind(language)
	.bind(query)
	.bind(category)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn fetch_experiences(db: &Db, ids: &[Uuid]) -> Result<Vec<ExperienceRow>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"SELECT {EXPERIENCE_COLUMNS}\nFROM experiences\nWHERE experience_id = ANY($1)"
	);
	let rows = sqlx::query_as::<_, ExperienceRow>(sql.as_str())
		.bind(ids)
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

pub async fn fetch_experience(db: &Db, id: Uuid) -> Result<Option<ExperienceRow>> {
	let sql = format!(
		"SELECT {EXPERIENCE_COLUMNS}\nFROM experiences\nWHERE experience_id = $1"
	);
	let row = sqlx::query_as::<_, ExperienceRow>(sql.as_str())
		.bind(id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

pub async fn fetch_profiles(db: &Db, author_ids: &[Uuid]) -> Result<Vec<ProfileRow>> {
	if author_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, ProfileRow>(
		"\
SELECT author_id,
	display_name,
	avatar_url
FROM profiles
WHERE author_id = ANY($1)",
	)
	.bind(author_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Similarity candidate pool for one source record: same-category rows
/// first, then the most recent of everything else.
pub async fn fetch_candidate_pool(
	db: &Db,
	source_id: Uuid,
	category: Option<&str>,
	limit: u32,
) -> Result<Vec<ExperienceRow>> {
	let sql = format!(
		"\
SELECT {EXPERIENCE_COLUMNS}
FROM experiences
WHERE experience_id <> $1
ORDER BY (category IS NOT DISTINCT FROM $2::text) DESC, created_at DESC
LIMIT $3"
	);
	let rows = sqlx::query_as::<_, ExperienceRow>(sql.as_str())
		.bind(source_id)
		.bind(category)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

pub async fn fetch_facet_rows(
	db: &Db,
	category: Option<&str>,
	location: Option<&str>,
	tags: Option<&[String]>,
	limit: u32,
) -> Result<Vec<FacetFieldRow>> {
	let rows = sqlx::query_as::<_, FacetFieldRow>(
		"\
SELECT category,
	location_name,
	tags,
	attributes,
	occurred_at
FROM experiences
WHERE ($1::text IS NULL OR category = $1)
	AND ($2::text IS NULL OR location_name = $2)
	AND ($3::text[] IS NULL OR tags && $3)
ORDER BY created_at DESC
LIMIT $4",
	)
	.bind(category)
	.bind(location)
	.bind(tags)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Title and tag completions for an autocomplete prefix. The prefix is
/// escaped so `%` and `_` in user input match literally.
pub async fn autocomplete_terms(db: &Db, prefix: &str, limit: u32) -> Result<Vec<String>> {
	let pattern = format!("{}%", escape_like(prefix));
	let titles: Vec<(String,)> = sqlx::query_as(
		"\
SELECT DISTINCT title
FROM experiences
WHERE title ILIKE $1
ORDER BY title
LIMIT $2",
	)
	.bind(pattern.as_str())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;
	let tags: Vec<(String,)> = sqlx::query_as(
		"\
SELECT DISTINCT tag
FROM experiences, unnest(tags) AS tag
WHERE tag ILIKE $1
ORDER BY tag
LIMIT $2",
	)
	.bind(pattern.as_str())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;
	let mut out = Vec::new();

	for (term,) in titles.into_iter().chain(tags) {
		if !out.contains(&term) {
			out.push(term);
		}
	}

	out.truncate(limit as usize);

	Ok(out)
}

pub async fn insert_analytics(db: &Db, record: &SearchAnalyticsRow) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO search_analytics (
	analytics_id,
	query,
	result_count,
	execution_time_ms,
	vector_weight,
	lexical_weight,
	search_type,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
	)
	.bind(record.analytics_id)
	.bind(record.query.as_str())
	.bind(record.result_count)
	.bind(record.execution_time_ms)
	.bind(record.vector_weight)
	.bind(record.lexical_weight)
	.bind(record.search_type.as_str())
	.bind(record.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_profile(db: &Db, profile: &ProfileRow) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO profiles (author_id, display_name, avatar_url)
VALUES ($1, $2, $3)
ON CONFLICT (author_id) DO UPDATE
SET display_name = EXCLUDED.display_name,
	avatar_url = EXCLUDED.avatar_url",
	)
	.bind(profile.author_id)
	.bind(profile.display_name.as_str())
	.bind(profile.avatar_url.as_deref())
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_experience(
	db: &Db,
	row: &ExperienceRow,
	embedding: Option<&[f32]>,
) -> Result<()> {
	let vec_text = embedding.map(format_vector_text);

	sqlx::query(
		"\
INSERT INTO experiences (
	experience_id,
	author_id,
	title,
	narrative,
	category,
	tags,
	duration,
	location_name,
	latitude,
	longitude,
	attributes,
	language,
	occurred_at,
	created_at,
	updated_at,
	embedding
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14, $15::text::vector)",
	)
	.bind(row.experience_id)
	.bind(row.author_id)
	.bind(row.title.as_str())
	.bind(row.narrative.as_str())
	.bind(row.category.as_deref())
	.bind(&row.tags)
	.bind(row.duration.as_deref())
	.bind(row.location_name.as_deref())
	.bind(row.latitude)
	.bind(row.longitude)
	.bind(&row.attributes)
	.bind(row.language.as_str())
	.bind(row.occurred_at)
	.bind(row.created_at)
	.bind(vec_text)
	.execute(&db.pool)
	.await?;

	Ok(())
}

fn format_vector_text(vec: &[f32]) -> String {
	let mut out = String::from("[");

	for (idx, value) in vec.iter().enumerate() {
		if idx > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

fn escape_like(input: &str) -> String {
	input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_vectors_as_pgvector_text() {
		assert_eq!(format_vector_text(&[0.5, -1.0, 2.0]), "[0.5,-1,2]");
	}

	#[test]
	fn escapes_like_wildcards() {
		assert_eq!(escape_like("50%_done\\"), "50\\%\\_done\\\\");
	}
}
