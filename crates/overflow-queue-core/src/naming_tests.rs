//! Tests for spillover blob naming.

use super::*;
use chrono::TimeZone;
use std::collections::HashSet;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

struct FixedIds(String);

impl IdGenerator for FixedIds {
    fn random_id(&self) -> String {
        self.0.clone()
    }
}

#[test]
fn name_is_date_prefixed() {
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap()));
    let ids = Arc::new(FixedIds("deadbeefdeadbeefdeadbeefdeadbeef".to_string()));
    let generator = BlobNameGenerator::with_parts(clock, ids);

    let name = generator.generate().unwrap();
    assert_eq!(name.as_str(), "2024-03-09-deadbeefdeadbeefdeadbeefdeadbeef");
}

#[test]
fn default_generator_produces_valid_unique_names() {
    let generator = BlobNameGenerator::new();

    let mut seen = HashSet::new();
    for _ in 0..100 {
        let name = generator.generate().unwrap();
        // date (10) + hyphen + 32 hex chars
        assert_eq!(name.as_str().len(), 43);
        assert!(seen.insert(name));
    }
}

#[test]
fn uuid_ids_are_32_lowercase_hex_chars() {
    let id = UuidGenerator.random_id();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}
