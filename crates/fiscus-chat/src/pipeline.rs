//! Exchange pipeline — orchestrates one inbound message end to end.
//!
//! The session controller calls [`ChatPipeline::handle_exchange`] with a
//! bounded event channel. The pipeline classifies the utterance once, then
//! branches exclusively:
//!
//! - **Create**: auto-creator persists the installments and one confirmation
//!   token is emitted.
//! - **Query**: retrieval + month aggregates build the grounding document,
//!   and generated tokens are relayed as they arrive, followed by a sources
//!   event.
//!
//! Exactly one [`ExchangeEvent::Done`] ends the exchange on every path,
//! including mid-stream provider failure (partial output is kept, never
//! retried). Provider errors never end the session — the caller decides
//! that on transport grounds only.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{error, warn};

use fiscus_core::OwnerId;
use fiscus_embeddings::{EmbeddingRecord, EmbeddingService};
use fiscus_llm::GenerationProvider;
use fiscus_store::{ConnectionPool, LedgerRepository};
use fiscus_tasks::TaskQueue;

use crate::context::{build_grounding_document, registration_date_br};
use crate::creator::AutoCreator;
use crate::intent::IntentRouter;
use crate::retriever::SemanticRetriever;
use crate::types::{ExchangeEvent, Intent, MonthRef, SourceCitation};

/// What one exchange produced, for message persistence.
#[derive(Clone, Debug, Default)]
pub struct ExchangeResult {
    /// Full reconstruction of the assistant's response.
    pub reply: String,
    /// Cited sources (query path only).
    pub sources: Option<serde_json::Value>,
}

/// The conversational pipeline.
pub struct ChatPipeline {
    pool: ConnectionPool,
    router: IntentRouter,
    creator: AutoCreator,
    retriever: SemanticRetriever,
    generation: Arc<dyn GenerationProvider>,
    top_k: usize,
}

impl ChatPipeline {
    /// Wire the pipeline over its providers and the shared pool.
    #[must_use]
    pub fn new(
        pool: ConnectionPool,
        generation: Arc<dyn GenerationProvider>,
        embedding: Arc<dyn EmbeddingService>,
        queue: TaskQueue,
        top_k: usize,
    ) -> Self {
        Self {
            router: IntentRouter::new(generation.clone()),
            creator: AutoCreator::new(pool.clone(), queue),
            retriever: SemanticRetriever::new(pool.clone(), embedding),
            pool,
            generation,
            top_k,
        }
    }

    /// Process one inbound utterance, emitting events as work progresses.
    ///
    /// Returns the full response reconstruction for persistence. Exactly one
    /// [`ExchangeEvent::Done`] is emitted before returning.
    pub async fn handle_exchange(
        &self,
        owner: &OwnerId,
        utterance: &str,
        month: MonthRef,
        events: &mpsc::Sender<ExchangeEvent>,
    ) -> ExchangeResult {
        let _ = emit(events, ExchangeEvent::Status("Analisando contexto...".into())).await;

        match self.router.classify(utterance, month).await {
            Intent::Create(intent) => {
                let result = match self.creator.create(owner, &intent) {
                    Ok(outcome) => {
                        let _ = emit(events, ExchangeEvent::Token(outcome.confirmation.clone())).await;
                        ExchangeResult {
                            reply: outcome.confirmation,
                            sources: None,
                        }
                    }
                    Err(e) => {
                        error!(owner = %owner, error = %e, "auto-creation failed");
                        ExchangeResult::default()
                    }
                };
                let _ = emit(events, ExchangeEvent::Done).await;
                result
            }
            Intent::Query => self.query_path(owner, utterance, month, events).await,
        }
    }

    async fn query_path(
        &self,
        owner: &OwnerId,
        utterance: &str,
        month: MonthRef,
        events: &mpsc::Sender<ExchangeEvent>,
    ) -> ExchangeResult {
        let _ = emit(events, ExchangeEvent::Status("Pesquisando lançamentos...".into())).await;

        let records = match self.retriever.retrieve(owner, utterance, self.top_k).await {
            Ok(records) => records,
            Err(e) => {
                warn!(owner = %owner, error = %e, "retrieval failed, ending exchange");
                let _ = emit(events, ExchangeEvent::Done).await;
                return ExchangeResult::default();
            }
        };

        let metrics = match self
            .pool
            .get()
            .map_err(|e| e.to_string())
            .and_then(|conn| {
                LedgerRepository::month_metrics(&conn, owner, month.year, month.month)
                    .map_err(|e| e.to_string())
            }) {
            Ok(metrics) => metrics,
            Err(e) => {
                error!(owner = %owner, error = %e, "month aggregation failed, ending exchange");
                let _ = emit(events, ExchangeEvent::Done).await;
                return ExchangeResult::default();
            }
        };

        let system = build_grounding_document(&metrics, &records);

        let _ = emit(events, ExchangeEvent::Status("Gerando resposta...".into())).await;
        let mut reply = String::new();
        match self.generation.generate_stream(utterance, Some(&system)).await {
            Ok(mut stream) => {
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(token) => {
                            reply.push_str(&token);
                            if !emit(events, ExchangeEvent::Token(token)).await {
                                break;
                            }
                        }
                        Err(e) => {
                            // Keep what was relayed; no retry.
                            warn!(owner = %owner, error = %e, "generation stream broke mid-exchange");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(owner = %owner, error = %e, "generation call failed");
            }
        }

        let citations = citations(&records);
        let sources_json = serde_json::to_value(&citations).ok();
        let _ = emit(events, ExchangeEvent::Sources(citations)).await;
        let _ = emit(events, ExchangeEvent::Done).await;

        ExchangeResult {
            reply,
            sources: sources_json,
        }
    }
}

fn citations(records: &[EmbeddingRecord]) -> Vec<SourceCitation> {
    records
        .iter()
        .map(|record| SourceCitation {
            entry_id: record.entry_id.clone(),
            content: record.content.clone(),
            registered_at: registration_date_br(record),
        })
        .collect()
}

/// Send an event; `false` means the session is gone and work should stop.
async fn emit(events: &mpsc::Sender<ExchangeEvent>, event: ExchangeEvent) -> bool {
    events.send(event).await.is_ok()
}
