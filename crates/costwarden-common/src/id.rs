use snowflake::SnowflakeIdBucket;
use std::sync::Mutex;

static ID_GENERATOR: Mutex<Option<SnowflakeIdBucket>> = Mutex::new(None);

/// Initialize the Snowflake ID generator for this process.
///
/// `machine_id` and `node_id` must each be in `0..=31`. Calling this is
/// optional; `next_id` falls back to `(1, 1)` when uninitialized.
pub fn init(machine_id: i32, node_id: i32) {
    let mut generator = ID_GENERATOR.lock().unwrap();
    *generator = Some(SnowflakeIdBucket::new(machine_id, node_id));
}

/// Generate a Snowflake ID as a decimal string.
pub fn next_id() -> String {
    let mut generator = ID_GENERATOR.lock().unwrap();
    let bucket = generator.get_or_insert_with(|| SnowflakeIdBucket::new(1, 1));
    bucket.get_id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn next_id_is_unique_across_many_calls() {
        init(1, 1);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let id = next_id();
            assert!(!id.is_empty());
            assert!(seen.insert(id), "duplicate ID generated");
        }
    }

    #[test]
    fn next_id_parses_as_i64() {
        init(1, 1);
        let id = next_id();
        assert!(id.parse::<i64>().is_ok(), "ID should be a valid i64: {id}");
    }
}
