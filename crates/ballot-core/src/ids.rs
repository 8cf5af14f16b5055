use std::time::{SystemTime, UNIX_EPOCH};

use ballot_types::PollId;

/// Time-derived, strictly monotonic poll id generator.
///
/// Ids are decimal Unix milliseconds. Two polls created within the same
/// millisecond get consecutive values, so ids never repeat within a process.
/// The generator is seeded past every numeric id already stored.
#[derive(Debug, Default)]
pub struct PollIdGenerator {
    last: u64,
}

impl PollIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after `id`.
    pub fn observe(&mut self, id: &PollId) {
        if let Some(n) = id.as_number() {
            self.last = self.last.max(n);
        }
    }

    /// Next id for the current wall-clock time.
    pub fn next_id(&mut self) -> Option<PollId> {
        self.next_at(now_ms())
    }

    /// Next id given the current time in milliseconds.
    ///
    /// Returns `None` only if the id space is exhausted.
    pub fn next_at(&mut self, now_ms: u64) -> Option<PollId> {
        let value = now_ms.max(self.last.checked_add(1)?);
        self.last = value;
        Some(PollId::new(value.to_string()))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_the_clock() {
        let mut ids = PollIdGenerator::new();
        assert_eq!(ids.next_at(1_000).unwrap().as_str(), "1000");
        assert_eq!(ids.next_at(5_000).unwrap().as_str(), "5000");
    }

    #[test]
    fn same_millisecond_yields_distinct_ids() {
        let mut ids = PollIdGenerator::new();
        let a = ids.next_at(42).unwrap();
        let b = ids.next_at(42).unwrap();
        let c = ids.next_at(41).unwrap();
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("42", "43", "44"));
    }

    #[test]
    fn observe_skips_past_stored_ids() {
        let mut ids = PollIdGenerator::new();
        ids.observe(&PollId::from("9000"));
        ids.observe(&PollId::from("not-a-number"));
        assert_eq!(ids.next_at(100).unwrap().as_str(), "9001");
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut ids = PollIdGenerator::new();
        ids.observe(&PollId::new(u64::MAX.to_string()));
        assert!(ids.next_at(0).is_none());
    }

    #[test]
    fn wall_clock_ids_are_recent() {
        let mut ids = PollIdGenerator::new();
        let id = ids.next_id().unwrap();
        // After 2020-01-01.
        assert!(id.as_number().unwrap() > 1_577_836_800_000);
    }
}
