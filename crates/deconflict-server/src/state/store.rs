//! Deconfliction services shared by all request handlers.

use anyhow::{Context, Result};
use deconflict_core::{
    ConflictClassifier, DeconflictionRules, DeconflictionService, LogisticClassifier,
    ScreeningPipeline, ValidationError,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::Config;

/// Application state: a stateless geometric checker plus the screening
/// pipeline, whose statistics need exclusive access.
pub struct AppState {
    rules: DeconflictionRules,
    service: DeconflictionService,
    pipeline: Mutex<ScreeningPipeline>,
    ml_available: bool,
}

impl AppState {
    pub fn new(
        rules: DeconflictionRules,
        classifier: Option<Box<dyn ConflictClassifier>>,
    ) -> Result<Self, ValidationError> {
        let ml_available = classifier.is_some();
        Ok(Self {
            service: DeconflictionService::new(&rules)?,
            pipeline: Mutex::new(ScreeningPipeline::new(&rules, classifier)?),
            rules,
            ml_available,
        })
    }

    /// Build state from server config, loading classifier weights if configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier: Option<Box<dyn ConflictClassifier>> = match &config.model_path {
            Some(path) => {
                let model = load_classifier(path)?;
                tracing::info!("Loaded conflict classifier from {}", path.display());
                Some(Box::new(model))
            }
            None => {
                tracing::warn!("No classifier configured, ML pre-screen disabled");
                None
            }
        };
        Self::new(config.rules.clone(), classifier).context("invalid deconfliction rules")
    }

    pub fn rules(&self) -> &DeconflictionRules {
        &self.rules
    }

    pub fn service(&self) -> &DeconflictionService {
        &self.service
    }

    pub fn ml_available(&self) -> bool {
        self.ml_available
    }

    /// Exclusive access to the pipeline. A panic mid-verification cannot
    /// leave the counters half-updated, so a poisoned lock is still usable.
    pub fn pipeline(&self) -> MutexGuard<'_, ScreeningPipeline> {
        self.pipeline.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read logistic classifier weights from a JSON file.
pub fn load_classifier(path: &Path) -> Result<LogisticClassifier> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read classifier weights {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid classifier weights in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deconflict_core::ConstantClassifier;

    #[test]
    fn ml_availability_follows_classifier() {
        let rules = DeconflictionRules::default();
        assert!(!AppState::new(rules.clone(), None).unwrap().ml_available());

        let state = AppState::new(rules, Some(Box::new(ConstantClassifier(0.5)))).unwrap();
        assert!(state.ml_available());
        assert!(state.pipeline().has_classifier());
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let rules = DeconflictionRules {
            time_resolution_s: 0.0,
            ..Default::default()
        };
        assert!(AppState::new(rules, None).is_err());
    }

    #[test]
    fn loads_weights_from_json() {
        let path = std::env::temp_dir().join(format!("classifier-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"weights": [0, 0, -0.1, 0, 0, 0, 0, 0, 0, 0], "bias": 2.0}"#,
        )
        .unwrap();

        let model = load_classifier(&path).unwrap();
        assert_eq!(model.bias, 2.0);
        assert_eq!(model.weights[2], -0.1);
        std::fs::remove_file(&path).unwrap();

        let err = load_classifier(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read classifier weights"));
    }
}
