//! API state management for the REST server.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::store::{Backend, MockBackend};

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    pub backend: Arc<dyn Backend>,
    pub config: Arc<Config>,
}

impl ApiState {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            config: Arc::new(config),
        }
    }

    /// State backed by the mock backend described in `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let backend = MockBackend::from_config(&config)?;
        Ok(Self::new(config, Arc::new(backend)))
    }

    /// Seeded backend without latency, for tests and docs
    pub fn seeded() -> Self {
        Self::new(Config::default(), Arc::new(MockBackend::seeded()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_state_serves_plans() {
        let state = ApiState::seeded();
        let plans = state.backend.list_plans().await.unwrap();
        assert_eq!(plans.len(), 4);
    }

    #[test]
    fn test_from_config_reads_fixtures() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fixtures.json");
        let mut data = crate::store::MockData::seeded();
        data.plans.truncate(1);
        std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        let mut config = Config::default();
        config.paths.fixtures = Some(path.to_string_lossy().to_string());
        assert!(ApiState::from_config(config).is_ok());

        let mut broken = Config::default();
        broken.paths.fixtures = Some(dir.path().join("missing.json").to_string_lossy().to_string());
        assert!(ApiState::from_config(broken).is_err());
    }
}
