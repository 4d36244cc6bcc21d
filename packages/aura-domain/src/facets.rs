use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

pub const TOP_LOCATIONS: usize = 20;
pub const TOP_TAGS: usize = 30;

// Whole-day thresholds, evaluated ascending; the first match wins.
const DATE_BUCKET_DAYS: &[i64] = &[7, 30, 90, 365];

// The witness attribute migrated key names at some point; both spellings
// are still live in stored records and count as synonyms.
const WITNESS_KEYS: &[&str] = &["witnesses", "witness_count"];

/// One row of the filtered result set, reduced to the fields faceting
/// reads. Aggregation never goes back to the datastore.
#[derive(Clone, Debug)]
pub struct FacetRow {
	pub category: Option<String>,
	pub location: Option<String>,
	pub tags: Vec<String>,
	pub attributes: Value,
	pub occurred_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FacetCount {
	pub value: String,
	pub count: u32,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WitnessCounts {
	pub none: u32,
	pub any: u32,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DateBuckets {
	pub within_7_days: u32,
	pub within_30_days: u32,
	pub within_90_days: u32,
	pub within_365_days: u32,
	pub older: u32,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FacetCounts {
	pub categories: BTreeMap<String, u32>,
	pub locations: Vec<FacetCount>,
	pub tags: Vec<FacetCount>,
	pub witnesses: WitnessCounts,
	pub date_buckets: DateBuckets,
}

/// Aggregates facet counts over an already-fetched result set. Output
/// ordering is deterministic: count descending, then value ascending.
pub fn aggregate(rows: &[FacetRow], now: OffsetDateTime) -> FacetCounts {
	let mut categories = BTreeMap::new();
	let mut locations: AHashMap<&str, u32> = AHashMap::new();
	let mut tags: AHashMap<&str, u32> = AHashMap::new();
	let mut witnesses = WitnessCounts::default();
	let mut date_buckets = DateBuckets::default();

	for row in rows {
		if let Some(category) = row.category.as_deref() {
			*categories.entry(category.to_string()).or_insert(0) += 1;
		}
		if let Some(location) = row.location.as_deref() {
			*locations.entry(location).or_insert(0) += 1;
		}

		for tag in &row.tags {
			*tags.entry(tag.as_str()).or_insert(0) += 1;
		}

		if has_witnesses(&row.attributes) {
			witnesses.any += 1;
		} else {
			witnesses.none += 1;
		}

		if let Some(occurred_at) = row.occurred_at {
			bucket_date(&mut date_buckets, now, occurred_at);
		}
	}

	FacetCounts {
		categories,
		locations: ranked(locations, TOP_LOCATIONS),
		tags: ranked(tags, TOP_TAGS),
		witnesses,
		date_buckets,
	}
}

fn ranked(tally: AHashMap<&str, u32>, cap: usize) -> Vec<FacetCount> {
	let mut out: Vec<FacetCount> = tally
		.into_iter()
		.map(|(value, count)| FacetCount { value: value.to_string(), count })
		.collect();

	out.sort_by(|left, right| {
		right.count.cmp(&left.count).then_with(|| left.value.cmp(&right.value))
	});
	out.truncate(cap);

	out
}

fn has_witnesses(attributes: &Value) -> bool {
	for key in WITNESS_KEYS {
		let Some(value) = attributes.get(key) else { continue };

		match value {
			Value::Number(number) => {
				if number.as_f64().unwrap_or(0.0) > 0.0 {
					return true;
				}
			},
			Value::Array(items) =>
				if !items.is_empty() {
					return true;
				},
			Value::Bool(flag) =>
				if *flag {
					return true;
				},
			_ => {},
		}
	}

	false
}

fn bucket_date(buckets: &mut DateBuckets, now: OffsetDateTime, occurred_at: OffsetDateTime) {
	let days = (now - occurred_at).whole_days();
	let slots = [
		&mut buckets.within_7_days,
		&mut buckets.within_30_days,
		&mut buckets.within_90_days,
		&mut buckets.within_365_days,
	];

	for (threshold, slot) in DATE_BUCKET_DAYS.iter().zip(slots) {
		if days <= *threshold {
			*slot += 1;

			return;
		}
	}

	buckets.older += 1;
}
