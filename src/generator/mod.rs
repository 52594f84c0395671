//! AI Data Orchestrator
//!
//! Public entry point of the pipeline. For one `(type, context)` request:
//! cache check → prompt build → LLM call → extract → recover → defensive
//! field re-walk → cache write → return.
//!
//! A failed LLM call does not propagate: the orchestrator emits a
//! fully-placeholdered record instead and caches it, so repeated failures do
//! not re-hit the provider for identical inputs within the cache window. A
//! degraded-but-complete document is preferred over a failed request.
//! Retrying is the adapter's concern, not this layer's.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ai::provider::{ChatRequest, OutputMode, SharedClient};
use crate::ai::{extract, prompt, recovery};
use crate::cache::{self, SharedCache};
use crate::catalog;
use crate::constants::cache as cache_constants;
use crate::types::{DocumentType, GeneratedRecord, RequestContext, Result};

/// Synthesizes complete document records, one request at a time.
///
/// Dependencies arrive through the constructor so the orchestrator can be
/// exercised without a live provider or cache backend.
pub struct DocumentDataGenerator {
    client: SharedClient,
    cache: SharedCache,
    mode: OutputMode,
    cache_ttl: Duration,
}

impl DocumentDataGenerator {
    pub fn new(client: SharedClient, cache: SharedCache) -> Self {
        Self {
            client,
            cache,
            mode: OutputMode::default(),
            cache_ttl: Duration::from_secs(cache_constants::DEFAULT_TTL_SECS),
        }
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Generate the record for one request.
    ///
    /// Always returns a record containing every field the catalog lists for
    /// `doc_type`, even when the provider is unreachable.
    pub async fn generate(
        &self,
        doc_type: DocumentType,
        ctx: &RequestContext,
    ) -> Result<GeneratedRecord> {
        let key = cache::request_key(doc_type, ctx);

        if let Some(record) = self.cache.get(&key) {
            debug!(%doc_type, "cache hit, skipping generation");
            return Ok(record);
        }

        info!(
            %doc_type,
            municipality = %ctx.municipality,
            provider = self.client.name(),
            "generating document data"
        );

        let request = ChatRequest {
            system: prompt::system_prompt(doc_type),
            user: prompt::user_prompt(doc_type, ctx),
            schema: Some(catalog::schema(doc_type)),
            mode: self.mode,
        };

        let mut record = match self.client.complete(&request).await {
            Ok(envelope) => {
                let raw = extract::extract_raw(&envelope, self.mode);
                recovery::recover(&raw, doc_type)
            }
            Err(err) => {
                warn!(
                    %doc_type,
                    error = %err,
                    "generation failed, emitting placeholder record"
                );
                recovery::placeholder_record(doc_type)
            }
        };

        recovery::ensure_complete(doc_type, &mut record);

        self.cache.put(&key, &record, self.cache_ttl);

        Ok(record)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::ai::provider::{AssistantMessage, ChatChoice, ChatEnvelope, LlmClient};
    use crate::cache::MemoryCache;
    use crate::constants::content;
    use crate::types::LicitaError;

    /// Programmable provider stub that counts completions.
    struct StubClient {
        response: Option<String>,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn returning(content: &str) -> Self {
            Self {
                response: Some(content.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for StubClient {
        async fn complete(&self, _request: &ChatRequest) -> crate::types::Result<ChatEnvelope> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Some(content) => Ok(ChatEnvelope {
                    choices: vec![ChatChoice {
                        message: AssistantMessage {
                            content: Some(content.clone()),
                            tool_calls: None,
                        },
                    }],
                    usage: None,
                }),
                None => Err(LicitaError::generation_transient("tempo esgotado")),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn ctx() -> RequestContext {
        RequestContext {
            municipality: "Curitiba".into(),
            institution: "Prefeitura Municipal".into(),
            address: "Av. Cândido de Abreu, 817".into(),
            object_description: "Aquisição de notebooks".into(),
            value: "150.000,00".into(),
            date: "26 de abril de 2025".into(),
        }
    }

    fn generator(stub: Arc<StubClient>) -> DocumentDataGenerator {
        DocumentDataGenerator::new(stub, Arc::new(MemoryCache::new()))
    }

    #[tokio::test]
    async fn partial_output_is_completed_with_placeholders() {
        let stub = Arc::new(StubClient::returning(
            r#"{"cidade":"Curitiba","cep":"80000"}"#,
        ));
        let generator = generator(stub.clone());

        let record = generator
            .generate(DocumentType::Institutional, &ctx())
            .await
            .unwrap();

        assert_eq!(record.text("cidade"), Some("Curitiba"));
        assert_eq!(record.text("cep"), Some("80000"));
        for field in catalog::fields(DocumentType::Institutional) {
            assert!(record.contains(field));
        }
        assert_eq!(record.text("nome_autoridade"), Some(content::PLACEHOLDER));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn every_type_is_complete_even_when_the_provider_fails() {
        for doc_type in DocumentType::ALL {
            let stub = Arc::new(StubClient::failing());
            let generator = generator(stub);
            let record = generator.generate(doc_type, &ctx()).await.unwrap();
            for field in catalog::fields(doc_type) {
                assert!(record.contains(field), "{doc_type} misses {field}");
            }
        }
    }

    #[tokio::test]
    async fn failed_generation_degrades_to_placeholders_and_is_cached() {
        let stub = Arc::new(StubClient::failing());
        let generator = generator(stub.clone());

        let first = generator
            .generate(DocumentType::ReferenceTerms, &ctx())
            .await
            .unwrap();
        for field in catalog::fields(DocumentType::ReferenceTerms) {
            assert_eq!(first.text(field), Some(content::PLACEHOLDER));
        }

        // Second identical request: served from cache, no further LLM call.
        let second = generator
            .generate(DocumentType::ReferenceTerms, &ctx())
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn identical_requests_are_idempotent_and_hit_cache() {
        let stub = Arc::new(StubClient::returning(r#"{"cidade":"Curitiba"}"#));
        let generator = generator(stub.clone());

        let first = generator
            .generate(DocumentType::Institutional, &ctx())
            .await
            .unwrap();

        // Differing address/date still map to the same fingerprint.
        let mut other = ctx();
        other.address = "Rua XV de Novembro, 1000".into();
        other.date = "27 de abril de 2025".into();
        let second = generator
            .generate(DocumentType::Institutional, &other)
            .await
            .unwrap();

        assert_eq!(stub.calls(), 1);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn risk_matrix_without_riscos_keeps_the_list_shape() {
        let stub = Arc::new(StubClient::returning(
            r#"{"processo_administrativo":"001/2025"}"#,
        ));
        let generator = generator(stub);

        let record = generator
            .generate(DocumentType::RiskMatrix, &ctx())
            .await
            .unwrap();

        let risks = record.risks("riscos").unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].evento, content::PLACEHOLDER);
    }

    #[tokio::test]
    async fn expired_cache_entries_trigger_regeneration() {
        let stub = Arc::new(StubClient::returning(r#"{"cidade":"Curitiba"}"#));
        let generator = generator(stub.clone()).with_cache_ttl(Duration::ZERO);

        generator
            .generate(DocumentType::Institutional, &ctx())
            .await
            .unwrap();
        generator
            .generate(DocumentType::Institutional, &ctx())
            .await
            .unwrap();

        assert_eq!(stub.calls(), 2);
    }
}
