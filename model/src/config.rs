use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_DEBOUNCE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormConfig {
    #[serde(with = "millis")]
    pub name_check_debounce: Duration,
    #[serde(with = "millis")]
    pub seed_search_debounce: Duration,
    pub min_search_chars: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            name_check_debounce: Duration::from_millis(500),
            seed_search_debounce: Duration::from_millis(300),
            min_search_chars: 0,
        }
    }
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name_check_debounce(mut self, delay: Duration) -> Self {
        self.name_check_debounce = delay;
        self
    }

    pub fn with_seed_search_debounce(mut self, delay: Duration) -> Self {
        self.seed_search_debounce = delay;
        self
    }

    pub fn with_min_search_chars(mut self, chars: usize) -> Self {
        self.min_search_chars = chars;
        self
    }

    /// Debounce both name checks and seed searches by the same delay.
    pub fn with_debounce(self, delay: Duration) -> Self {
        self.with_name_check_debounce(delay)
            .with_seed_search_debounce(delay)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name_check_debounce > MAX_DEBOUNCE {
            return Err("Name check debounce must be at most 10 seconds".to_string());
        }

        if self.seed_search_debounce > MAX_DEBOUNCE {
            return Err("Seed search debounce must be at most 10 seconds".to_string());
        }

        if self.min_search_chars > 50 {
            return Err("Minimum search length must be at most 50 characters".to_string());
        }

        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
