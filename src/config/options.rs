// src/config/options.rs
use super::models::{CheckDefinition, CheckKind, Config};
use crate::checks::{HttpCheck, TcpCheck};
use crate::health::{CheckConfig, CheckDefaults, CheckHandler};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything a kernel is configured with: the file-level [`Config`] plus
/// the checks to run, whether declared in the file or registered in code.
#[derive(Debug, Clone, Default)]
pub struct HealthOptions {
    pub config: Config,
    pub checks: BTreeMap<String, CheckConfig>,
}

impl HealthOptions {
    pub fn new(config: Config) -> Self {
        let checks = config
            .checks
            .iter()
            .map(|(name, definition)| (name.clone(), build_check(definition)))
            .collect();

        Self { config, checks }
    }

    pub fn check(self, name: impl Into<String>, handler: impl CheckHandler) -> Self {
        self.check_with(name, CheckConfig::new(handler))
    }

    pub fn check_with(mut self, name: impl Into<String>, config: CheckConfig) -> Self {
        self.checks.insert(name.into(), config);
        self
    }

    pub fn check_defaults(&self) -> CheckDefaults {
        self.config.defaults.check_defaults()
    }
}

fn build_check(definition: &CheckDefinition) -> CheckConfig {
    let handler: Arc<dyn CheckHandler> = match &definition.kind {
        CheckKind::Http {
            url,
            expected_status,
        } => {
            let check = HttpCheck::new(url.clone());
            match expected_status {
                Some(status) => Arc::new(check.expect_status(*status)),
                None => Arc::new(check),
            }
        }
        CheckKind::Tcp { address } => Arc::new(TcpCheck::new(address.clone())),
        CheckKind::Redis { address } => Arc::new(TcpCheck::redis(address.clone())),
    };

    CheckConfig {
        handler,
        timeout: definition.timeout.map(|i| i.as_duration()),
        retries: definition.retries,
        critical: definition.critical,
        weight: definition.weight,
        backoff: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{check_fn, CheckOutcome};
    use std::time::Duration;

    #[test]
    fn test_file_checks_are_built() {
        let json = r#"{
            "checks": {
                "db": { "type": "tcp", "address": "localhost:5432", "critical": true, "timeout": "2s" },
                "api": { "type": "http", "url": "http://localhost/ping" }
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let options = HealthOptions::new(config);

        assert_eq!(options.checks.len(), 2);
        let db = &options.checks["db"];
        assert_eq!(db.critical, Some(true));
        assert_eq!(db.timeout, Some(Duration::from_secs(2)));
        assert_eq!(options.checks["api"].critical, None);
    }

    #[test]
    fn test_code_checks_override_file_checks() {
        let json = r#"{ "checks": { "db": { "type": "tcp", "address": "localhost:5432" } } }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        let options = HealthOptions::new(config).check_with(
            "db",
            CheckConfig::new(check_fn(|| async { Ok(CheckOutcome::healthy()) })).weight(3.0),
        );

        assert_eq!(options.checks.len(), 1);
        assert_eq!(options.checks["db"].weight, Some(3.0));
    }
}
