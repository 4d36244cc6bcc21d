use std::{collections::HashMap, sync::Mutex};

use time::{Duration, OffsetDateTime};

/// Outcome of a rate-limit check. `reset_at` is populated on every
/// decision, allowed or denied, so callers can pace proactively.
#[derive(Clone, Copy, Debug)]
pub struct RateDecision {
	pub allowed: bool,
	pub remaining: u32,
	pub reset_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug)]
struct RateRecord {
	window_start: OffsetDateTime,
	count: u32,
}

/// Fixed sliding-window request counter keyed by caller identifier.
///
/// Each endpoint class owns its own governor instance; nothing here is
/// process-global. All record state lives behind one lock so that
/// concurrent checks for the same key can never both take the last slot.
/// The in-memory map is single-instance state; a multi-instance deployment
/// must back the same check/increment contract with an atomic external
/// counter.
pub struct RateGovernor {
	limit: u32,
	window: Duration,
	records: Mutex<HashMap<String, RateRecord>>,
}
impl RateGovernor {
	pub fn new(limit: u32, window: Duration) -> Self {
		Self { limit, window, records: Mutex::new(HashMap::new()) }
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}

	pub fn check(&self, key: &str) -> RateDecision {
		self.check_at(key, OffsetDateTime::now_utc())
	}

	pub fn check_at(&self, key: &str, now: OffsetDateTime) -> RateDecision {
		let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());

		match records.get_mut(key) {
			Some(record) if now - record.window_start < self.window => {
				if record.count >= self.limit {
					return RateDecision {
						allowed: false,
						remaining: 0,
						reset_at: record.window_start + self.window,
					};
				}

				record.count += 1;

				RateDecision {
					allowed: true,
					remaining: self.limit - record.count,
					reset_at: record.window_start + self.window,
				}
			},
			_ => {
				records.insert(key.to_string(), RateRecord { window_start: now, count: 1 });

				RateDecision {
					allowed: true,
					remaining: self.limit.saturating_sub(1),
					reset_at: now + self.window,
				}
			},
		}
	}

	/// Drops every record whose window has elapsed. Shares the record lock
	/// with `check`, so the sweep cannot race an in-flight increment.
	pub fn sweep(&self) -> usize {
		self.sweep_at(OffsetDateTime::now_utc())
	}

	pub fn sweep_at(&self, now: OffsetDateTime) -> usize {
		let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());
		let before = records.len();

		records.retain(|_, record| now - record.window_start < self.window);

		before - records.len()
	}

	pub fn tracked_keys(&self) -> usize {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	};

	use super::*;

	#[test]
	fn sequential_checks_follow_the_window_contract() {
		let governor = RateGovernor::new(3, Duration::seconds(60));
		let start = OffsetDateTime::now_utc();
		let mut allowed = Vec::new();
		let mut remaining = Vec::new();

		for _ in 0..4 {
			let decision = governor.check_at("alice", start);

			allowed.push(decision.allowed);
			remaining.push(decision.remaining);

			assert_eq!(decision.reset_at, start + Duration::seconds(60));
		}

		assert_eq!(allowed, vec![true, true, true, false]);
		assert_eq!(remaining, vec![2, 1, 0, 0]);

		let after_window = governor.check_at("alice", start + Duration::seconds(60));

		assert!(after_window.allowed);
		assert_eq!(after_window.remaining, 2);
	}

	#[test]
	fn keys_are_counted_independently() {
		let governor = RateGovernor::new(1, Duration::seconds(60));
		let now = OffsetDateTime::now_utc();

		assert!(governor.check_at("alice", now).allowed);
		assert!(!governor.check_at("alice", now).allowed);
		assert!(governor.check_at("bob", now).allowed);
	}

	#[test]
	fn sweep_removes_only_elapsed_records() {
		let governor = RateGovernor::new(3, Duration::seconds(60));
		let start = OffsetDateTime::now_utc();

		governor.check_at("old", start);
		governor.check_at("fresh", start + Duration::seconds(45));

		let removed = governor.sweep_at(start + Duration::seconds(70));

		assert_eq!(removed, 1);
		assert_eq!(governor.tracked_keys(), 1);
	}

	#[test]
	fn concurrent_checks_admit_exactly_the_limit() {
		let limit = 8_u32;
		let governor = Arc::new(RateGovernor::new(limit, Duration::seconds(60)));
		let admitted = Arc::new(AtomicU32::new(0));
		let now = OffsetDateTime::now_utc();
		let mut handles = Vec::new();

		for _ in 0..limit {
			let governor = Arc::clone(&governor);
			let admitted = Arc::clone(&admitted);

			handles.push(std::thread::spawn(move || {
				if governor.check_at("stress", now).allowed {
					admitted.fetch_add(1, Ordering::SeqCst);
				}
			}));
		}

		for handle in handles {
			handle.join().expect("Worker thread panicked.");
		}

		assert_eq!(admitted.load(Ordering::SeqCst), limit);
		assert!(!governor.check_at("stress", now).allowed);
	}
}
