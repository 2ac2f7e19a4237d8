use serde::{Deserialize, Serialize};

/// Configuration for the users_info module (`modules.users_info`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    /// Buffered events per SSE subscriber before the oldest are dropped.
    #[serde(default = "default_events_capacity")]
    pub events_capacity: usize,
}

impl Default for UsersInfoConfig {
    fn default() -> Self {
        Self {
            events_capacity: default_events_capacity(),
        }
    }
}

fn default_events_capacity() -> usize {
    1024
}
