pub type Result<T> = core::result::Result<T, EventlyError>;

#[derive(thiserror::Error, Debug)]
pub enum EventlyError {
    #[error("semaphore closed before all tasks completed")]
    SemaphoreClosed,
    #[error("{0}")]
    Message(String),
}

pub mod config {
    use serde::Deserialize;
    use std::env;

    #[derive(Debug, Clone, Deserialize)]
    pub struct EventlyConfig {
        pub base_url: String,
        pub event_id: u32,
        pub total_requests: usize,
        pub concurrency: usize,
        pub port: u16,
    }

    impl Default for EventlyConfig {
        fn default() -> Self {
            Self {
                base_url: "http://localhost:3000".into(),
                event_id: 3,
                total_requests: 300,
                concurrency: 20,
                port: 3000,
            }
        }
    }

    impl EventlyConfig {
        pub fn load() -> Self {
            if let Ok(path) = env::var("EVENTLY_CONFIG") {
                let Ok(text) = std::fs::read_to_string(path) else { return Self::default() };
                let Ok(cfg) = serde_yaml::from_str::<EventlyConfig>(&text) else { return Self::default() };
                return cfg;
            }
            let mut cfg = Self::default();
            if let Ok(url) = env::var("EVENTLY_BASE_URL") {
                cfg.base_url = url;
            }
            if let Some(v) = env::var("EVENTLY_EVENT_ID").ok().and_then(|v| v.parse().ok()) { cfg.event_id = v; }
            if let Some(v) = env::var("EVENTLY_TOTAL_REQUESTS").ok().and_then(|v| v.parse().ok()) { cfg.total_requests = v; }
            if let Some(v) = env::var("EVENTLY_CONCURRENCY").ok().and_then(|v| v.parse().ok()) { cfg.concurrency = v; }
            if let Some(v) = env::var("EVENTLY_PORT").ok().and_then(|v| v.parse().ok()) { cfg.port = v; }
            cfg
        }
    }

    #[cfg(test)]
    mod tests {
        use super::EventlyConfig;

        #[test]
        fn defaults_match_fixed_parameters() {
            let cfg = EventlyConfig::default();
            assert_eq!(cfg.base_url, "http://localhost:3000");
            assert_eq!(cfg.event_id, 3);
            assert_eq!(cfg.total_requests, 300);
            assert_eq!(cfg.concurrency, 20);
        }

        #[test]
        fn yaml_round_trip() {
            let text = "base_url: http://127.0.0.1:8080\nevent_id: 7\ntotal_requests: 50\nconcurrency: 5\nport: 8080\n";
            let cfg: EventlyConfig = serde_yaml::from_str(text).unwrap();
            assert_eq!(cfg.base_url, "http://127.0.0.1:8080");
            assert_eq!(cfg.event_id, 7);
            assert_eq!(cfg.total_requests, 50);
            assert_eq!(cfg.concurrency, 5);
        }
    }
}
