use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct CacheState {
    last_url: Option<String>,
    last_token: Option<String>,
}

/// Per-service state shared by every request of one service.
#[derive(Debug, Clone, Default)]
pub struct ServiceCache {
    state: Arc<Mutex<CacheState>>,
}

impl ServiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the endpoint URL and token of the latest request. Returns
    /// `true` when either differs from the previous pair.
    pub fn remember(&self, url: &str, token: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        let changed = state.last_url.as_deref() != Some(url)
            || state.last_token.as_deref() != Some(token);
        if changed {
            state.last_url = Some(url.to_string());
            state.last_token = Some(token.to_string());
        }
        changed
    }

    pub fn last_url(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        state.last_url.clone()
    }

    pub fn last_token(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        state.last_token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_reports_changes_only() {
        let cache = ServiceCache::new();
        assert!(cache.remember("https://nova/v2.1", "t1"));
        assert!(!cache.remember("https://nova/v2.1", "t1"));
        assert!(cache.remember("https://nova/v2.1", "t2"));
        assert_eq!(cache.last_token().as_deref(), Some("t2"));
    }

    #[test]
    fn clones_share_the_last_pair() {
        let cache = ServiceCache::new();
        let other = cache.clone();
        other.remember("https://nova/v2.1", "t1");
        assert_eq!(cache.last_url().as_deref(), Some("https://nova/v2.1"));
        assert!(!cache.remember("https://nova/v2.1", "t1"));
    }
}
