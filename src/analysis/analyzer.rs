//! Remote log analysis.
//!
//! Flow for one snippet:
//! 1. Cache lookup by fingerprint (no network on a hit)
//! 2. Prompt construction
//! 3. Completion call with retry/backoff
//! 4. Response parsing and repair
//! 5. Cache fill for actionable diagnoses

use std::sync::Arc;

use parking_lot::Mutex;

use crate::analysis::cache::{cache_key, ResponseCache};
use crate::analysis::client::{CompletionBackend, CompletionRequest};
use crate::analysis::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::analysis::response::{parse_response, Diagnosis};
use crate::analysis::retry::RetryPolicy;
use crate::extraction::patterns::Category;
use crate::logging::structured::LogContext;
use crate::storage::models::IssueMetadata;

/// Diagnoses snippets through a completion backend.
pub struct RemoteAnalyzer {
    backend: Arc<dyn CompletionBackend>,
    model_name: String,
    retry: RetryPolicy,
    cache: Mutex<ResponseCache>,
}

impl RemoteAnalyzer {
    pub fn new(backend: Arc<dyn CompletionBackend>, model_name: &str) -> Self {
        log::info!("REMOTE_ANALYZER_INIT model={}", model_name);
        Self {
            backend,
            model_name: model_name.to_string(),
            retry: RetryPolicy::default(),
            cache: Mutex::new(ResponseCache::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Mutex::new(cache);
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }

    /// Diagnose one snippet.
    ///
    /// Returns `None` when the service failed, gave up after retries, or
    /// answered with an empty body. Unparseable bodies yield the fixed
    /// format-error diagnosis instead of an error.
    pub async fn analyze(
        &self,
        snippet: &str,
        category: Category,
        metadata: Option<&IssueMetadata>,
        ctx: &LogContext,
    ) -> Option<Diagnosis> {
        let key = cache_key(snippet, category);

        let cached = self.cache.lock().get(&key).cloned();
        if let Some(cached) = cached {
            log::debug!("{} ANALYSIS_CACHE_HIT key={:?}", ctx, key);
            return Some(cached);
        }

        let prompt = build_prompt(snippet, category, metadata);
        let request = CompletionRequest::diagnosis(&self.model_name, SYSTEM_PROMPT, &prompt);

        log::debug!(
            "{} ANALYSIS_REQUEST model={} prompt_chars={}",
            ctx,
            self.model_name,
            prompt.chars().count()
        );

        let body = match self.retry.call(self.backend.as_ref(), &request).await {
            Ok(body) => body,
            Err(e) => {
                log::error!("{} ANALYSIS_FAILED error={}", ctx, e);
                return None;
            }
        };

        if body.is_empty() {
            log::error!("{} ANALYSIS_EMPTY_RESPONSE", ctx);
            return None;
        }

        let diagnosis = parse_response(&body);

        if diagnosis.is_actionable() {
            self.cache.lock().put(key, diagnosis.clone());
        }

        log::info!(
            "{} ANALYSIS_COMPLETE confidence={} actionable={}",
            ctx,
            diagnosis.confidence,
            diagnosis.is_actionable()
        );

        Some(diagnosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::error::CompletionError;

    struct FixedBackend {
        reply: Result<String, CompletionError>,
        calls: AtomicU32,
    }

    impl FixedBackend {
        fn new(reply: Result<String, CompletionError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn ctx() -> LogContext {
        LogContext::new("scan-test")
    }

    const SNIPPET: &str = "2024-01-01 10:00:00 WARNING Entity light.kitchen is unavailable";

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let backend = FixedBackend::new(Ok(
            r#"{"suggested_fix": "Check device power", "confidence": 80}"#.to_string(),
        ));
        let analyzer = RemoteAnalyzer::new(backend.clone(), "gpt-3.5-turbo");

        let first = analyzer
            .analyze(SNIPPET, Category::EntityUnavailable, None, &ctx())
            .await;
        let second = analyzer
            .analyze(SNIPPET, Category::EntityUnavailable, None, &ctx())
            .await;

        assert_eq!(first, second);
        assert_eq!(first.map(|d| d.confidence), Some(80));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(analyzer.cached_entries(), 1);
    }

    #[tokio::test]
    async fn test_empty_body_is_absent() {
        let backend = FixedBackend::new(Ok(String::new()));
        let analyzer = RemoteAnalyzer::new(backend, "gpt-3.5-turbo");

        let result = analyzer
            .analyze(SNIPPET, Category::EntityUnavailable, None, &ctx())
            .await;

        assert!(result.is_none());
        assert_eq!(analyzer.cached_entries(), 0);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_is_absent() {
        let backend = FixedBackend::new(Err(CompletionError::from_status(400, "bad request")));
        let analyzer = RemoteAnalyzer::new(backend.clone(), "gpt-3.5-turbo");

        let result = analyzer
            .analyze(SNIPPET, Category::EntityUnavailable, None, &ctx())
            .await;

        assert!(result.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unparseable_body_yields_fallback() {
        let backend = FixedBackend::new(Ok("I cannot help with that".to_string()));
        let analyzer = RemoteAnalyzer::new(backend, "gpt-3.5-turbo");

        let result = analyzer
            .analyze(SNIPPET, Category::GeneralError, None, &ctx())
            .await;

        assert_eq!(result, Some(Diagnosis::format_error()));
    }

    struct RateLimitedThenOk {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CompletionBackend for RateLimitedThenOk {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(CompletionError::from_status(429, "slow down"))
            } else {
                Ok(r#"{"suggested_fix": "Restart the integration", "confidence": 70}"#.to_string())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_backs_off_then_succeeds() {
        let backend = Arc::new(RateLimitedThenOk {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let analyzer = RemoteAnalyzer::new(backend.clone(), "gpt-3.5-turbo");
        let started = tokio::time::Instant::now();

        let result = analyzer
            .analyze(SNIPPET, Category::EntityUnavailable, None, &ctx())
            .await;

        assert_eq!(
            result.map(|d| d.suggested_fix),
            Some("Restart the integration".to_string())
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        let waited = started.elapsed();
        assert!(waited >= std::time::Duration::from_secs(6));
        assert!(waited < std::time::Duration::from_millis(6_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhausted_is_absent() {
        let backend = Arc::new(RateLimitedThenOk {
            failures: 10,
            calls: AtomicU32::new(0),
        });
        let analyzer = RemoteAnalyzer::new(backend.clone(), "gpt-3.5-turbo");

        let result = analyzer
            .analyze(SNIPPET, Category::EntityUnavailable, None, &ctx())
            .await;

        assert!(result.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_null_fix_is_returned_but_not_cached() {
        let backend = FixedBackend::new(Ok(r#"{"suggested_fix": null}"#.to_string()));
        let analyzer = RemoteAnalyzer::new(backend.clone(), "gpt-3.5-turbo");

        for _ in 0..2 {
            let result = analyzer
                .analyze(SNIPPET, Category::GeneralError, None, &ctx())
                .await;
            assert_eq!(result.map(|d| d.suggested_fix), Some(String::new()));
        }
        assert_eq!(analyzer.cached_entries(), 0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_retry_policy_limits_attempts() {
        let backend = Arc::new(RateLimitedThenOk {
            failures: 10,
            calls: AtomicU32::new(0),
        });
        let analyzer = RemoteAnalyzer::new(backend.clone(), "gpt-3.5-turbo").with_retry_policy(
            RetryPolicy {
                max_attempts: 2,
                base_delay: std::time::Duration::from_millis(10),
            },
        );
        let started = tokio::time::Instant::now();

        let result = analyzer
            .analyze(SNIPPET, Category::EntityUnavailable, None, &ctx())
            .await;

        assert!(result.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_injected_cache_capacity_evicts_oldest() {
        let backend = FixedBackend::new(Ok(r#"{"suggested_fix": "Fix"}"#.to_string()));
        let analyzer = RemoteAnalyzer::new(backend.clone(), "gpt-4")
            .with_cache(ResponseCache::with_capacity(1));
        assert_eq!(analyzer.model_name(), "gpt-4");

        let other = "2024-01-01 10:00:00 WARNING Entity switch.fan is unavailable";
        for snippet in [SNIPPET, other, SNIPPET] {
            analyzer
                .analyze(snippet, Category::EntityUnavailable, None, &ctx())
                .await;
        }

        assert_eq!(analyzer.cached_entries(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }
}
