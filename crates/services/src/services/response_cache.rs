use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;

/// In-memory response cache keyed by `METHOD:path` strings. The
/// assignment workflow only ever calls [`invalidate`]; population and
/// reads belong to the HTTP caching layer.
///
/// [`invalidate`]: ResponseCacheService::invalidate
#[derive(Clone, Default)]
pub struct ResponseCacheService {
    entries: Arc<DashMap<String, Value>>,
}

impl ResponseCacheService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    /// Drops every key matching `pattern`. A pattern that fails to
    /// compile as a regex is matched literally instead of being
    /// silently ignored.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let regex = Regex::new(pattern)
            .or_else(|_| Regex::new(&regex::escape(pattern)))
            .ok();
        let Some(regex) = regex else {
            return 0;
        };

        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| regex.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        for key in &matching {
            self.entries.remove(key);
        }
        if !matching.is_empty() {
            tracing::debug!("invalidated {} cached responses for {}", matching.len(), pattern);
        }
        matching.len()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ResponseCacheService;

    #[test]
    fn invalidate_drops_matching_keys_only() {
        let cache = ResponseCacheService::new();
        cache.set("GET:/work-assignments/B0101/2025/7", json!({"a": 1}));
        cache.set("GET:/work-assignments/B0202/2025/7", json!({"b": 2}));
        cache.set("GET:/employees", json!([]));

        let removed = cache.invalidate("GET:/work-assignments");

        assert_eq!(removed, 2);
        assert!(cache.get("GET:/work-assignments/B0101/2025/7").is_none());
        assert_eq!(cache.get("GET:/employees"), Some(json!([])));
    }

    #[test]
    fn invalid_regex_falls_back_to_literal_match() {
        let cache = ResponseCacheService::new();
        cache.set("GET:/weird[key", json!(1));
        assert_eq!(cache.invalidate("GET:/weird[key"), 1);
    }
}
