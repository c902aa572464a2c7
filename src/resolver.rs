//! Tiered solution lookup.
//!
//! Tiers run in order and stop at the first success: knowledge-base keyword,
//! classifier category (cached or fresh) mapped through the category fix
//! table, then the remediation API. Failures in the later tiers are logged
//! and turned into the next tier or a `none` result; `resolve` never fails.

use crate::category::fix_for_label;
use crate::classifier::{CategoryClassifier, KeywordClassifier, Prediction, UnavailableClassifier};
use crate::config::AnalyzerConfig;
use crate::error::{ClassifierError, RemediationError};
use crate::knowledge_base::{KeywordIndex, KnowledgeBase};
use crate::models::SolutionResult;
use crate::prediction_cache::PredictionCache;
use crate::remediation::{is_error_answer, DisabledRemediation, HttpRemediationClient, RemediationApi};
use crate::store::JsonFileStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SolutionResolver {
    knowledge_base: Arc<KnowledgeBase>,
    predictions: Arc<PredictionCache>,
    classifier: Arc<dyn CategoryClassifier>,
    remediation: Arc<dyn RemediationApi>,
    /// Tier-1 view taken at construction; answers saved later only show up after `reset`
    keywords: RwLock<KeywordIndex>,
    /// Exact message → result for the lifetime of the process, never persisted
    memo: RwLock<HashMap<String, Arc<SolutionResult>>>,
}

impl SolutionResolver {
    pub fn new(
        knowledge_base: Arc<KnowledgeBase>,
        predictions: Arc<PredictionCache>,
        classifier: Arc<dyn CategoryClassifier>,
        remediation: Arc<dyn RemediationApi>,
    ) -> Self {
        let keywords = RwLock::new(knowledge_base.snapshot());
        Self {
            knowledge_base,
            keywords,
            predictions,
            classifier,
            remediation,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Wire up file-backed stores, the configured classifier and the remediation client
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let knowledge_base = KnowledgeBase::open(Box::new(JsonFileStore::new(&config.knowledge_base_path)));
        let predictions = PredictionCache::open(Box::new(JsonFileStore::new(&config.prediction_cache_path)));

        Self::new(
            Arc::new(knowledge_base),
            Arc::new(predictions),
            build_classifier(config),
            build_remediation(config),
        )
    }

    /// Best-effort solution for `message`. Repeated calls with the same
    /// message return the same shared result without re-running any tier.
    pub fn resolve(&self, message: &str) -> Arc<SolutionResult> {
        if let Some(hit) = self.memo.read().get(message) {
            return Arc::clone(hit);
        }

        let result = Arc::new(self.compute(message));
        let mut memo = self.memo.write();
        // A concurrent caller may have finished first; keep the first result
        Arc::clone(memo.entry(message.to_string()).or_insert(result))
    }

    /// Run only the classifier, bypassing caches
    pub fn predict(&self, message: &str) -> Result<Option<Prediction>, ClassifierError> {
        self.classifier.predict(message)
    }

    /// Forget memoized results and pick up knowledge-base writes made since
    /// the resolver was built or last reset. Persisted stores are untouched.
    pub fn reset(&self) {
        let mut memo = self.memo.write();
        *self.keywords.write() = self.knowledge_base.snapshot();
        memo.clear();
    }

    pub fn memo_len(&self) -> usize {
        self.memo.read().len()
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge_base
    }

    pub fn predictions(&self) -> &Arc<PredictionCache> {
        &self.predictions
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    fn compute(&self, message: &str) -> SolutionResult {
        let keywords = self.keywords.read().clone();
        if let Some(hit) = keywords.find(message) {
            debug!(keyword = %hit.keyword, "knowledge base hit");
            return SolutionResult::from_knowledge_base(&hit.keyword, &hit.solution);
        }

        if let Some(result) = self.predicted_fix(message) {
            return result;
        }

        self.api_fallback(message)
    }

    fn predicted_fix(&self, message: &str) -> Option<SolutionResult> {
        let (category, confidence) = match self.predictions.get(message) {
            Some(category) => {
                debug!(category = %category, "prediction cache hit");
                (category, None)
            }
            None => match self.classifier.predict(message) {
                Ok(Some(prediction)) => {
                    if let Err(e) = self.predictions.record(message, &prediction.category) {
                        warn!(error = %e, "failed to persist prediction");
                    }
                    (prediction.category, prediction.confidence)
                }
                Ok(None) => {
                    debug!("classifier returned no category");
                    return None;
                }
                Err(e) => {
                    warn!(classifier = self.classifier.name(), error = %e, "classifier failed");
                    return None;
                }
            },
        };

        match fix_for_label(&category) {
            Some(fix) => Some(SolutionResult::from_prediction(&category, confidence, fix)),
            None => {
                debug!(category = %category, "category has no generic fix");
                None
            }
        }
    }

    fn api_fallback(&self, message: &str) -> SolutionResult {
        let answer = match self.remediation.fetch(message) {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "remediation API failed");
                return SolutionResult::not_found(&e.to_string());
            }
        };

        if answer.is_empty() {
            return SolutionResult::not_found(&RemediationError::EmptyResponse.to_string());
        }

        if is_error_answer(&answer) {
            debug!("remediation API reported an error, not saving");
            return SolutionResult::from_api(&answer, false);
        }

        let saved = match self.knowledge_base.upsert(message, &answer) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save remediation answer");
                false
            }
        };
        SolutionResult::from_api(&answer, saved)
    }
}

fn build_classifier(config: &AnalyzerConfig) -> Arc<dyn CategoryClassifier> {
    let min_confidence = config.classifier.min_confidence;
    match &config.classifier.model_path {
        None => Arc::new(KeywordClassifier::builtin().with_min_confidence(min_confidence)),
        Some(path) => match KeywordClassifier::from_path(path) {
            Ok(classifier) => Arc::new(classifier.with_min_confidence(min_confidence)),
            Err(e) => {
                warn!(error = %e, "classifier model could not be loaded, predictions disabled");
                Arc::new(UnavailableClassifier::new(e.to_string()))
            }
        },
    }
}

fn build_remediation(config: &AnalyzerConfig) -> Arc<dyn RemediationApi> {
    if !config.remediation.enabled {
        return Arc::new(DisabledRemediation);
    }
    match HttpRemediationClient::new(config.remediation.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "remediation client unavailable");
            Arc::new(DisabledRemediation)
        }
    }
}
