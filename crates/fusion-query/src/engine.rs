//! Pipeline orchestration around the fusion engine.
//!
//! One run expands the user question into several queries, retrieves each
//! query concurrently, joins, fuses the per-query rankings, and hands the
//! fused ordering to the synthesizer.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use fusion_core::{
    Corpus, FailurePolicy, FusedRanking, FusionError, QueryExpander, RankFusionConfig,
    RankedResultSet, Result, Retriever, Synthesizer,
};

use crate::fusion::{reciprocal_rank_fusion, DEFAULT_RRF_K};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// RRF dampening constant.
    pub rrf_k: f32,

    /// How to handle a failed retrieval call.
    pub failure_policy: FailurePolicy,

    /// Fall back to rendering the fused ranking when synthesis fails.
    pub synthesis_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            failure_policy: FailurePolicy::Degrade,
            synthesis_fallback: true,
        }
    }
}

impl From<&RankFusionConfig> for PipelineConfig {
    fn from(config: &RankFusionConfig) -> Self {
        Self {
            rrf_k: config.rrf_k,
            failure_policy: config.failure_policy,
            synthesis_fallback: config.synthesis_fallback,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The original user question.
    pub question: String,

    /// The expanded queries that were retrieved (deduplicated).
    pub queries: Vec<String>,

    /// The fused ranking the answer was built from.
    pub ranking: FusedRanking,

    /// The user-visible answer.
    pub answer: String,

    /// End-to-end latency in milliseconds.
    pub latency_ms: u64,
}

/// RAG fusion pipeline.
///
/// Collaborators are injected at construction; the pipeline holds no other
/// state and may serve concurrent runs.
pub struct FusionPipeline<X, R, G> {
    /// Query expansion service.
    expander: Arc<X>,

    /// Retrieval service.
    retriever: Arc<R>,

    /// Answer synthesis service.
    synthesizer: Arc<G>,
}

impl<X, R, G> FusionPipeline<X, R, G>
where
    X: QueryExpander + 'static,
    R: Retriever + 'static,
    G: Synthesizer + 'static,
{
    /// Create a new pipeline.
    pub fn new(expander: Arc<X>, retriever: Arc<R>, synthesizer: Arc<G>) -> Self {
        Self {
            expander,
            retriever,
            synthesizer,
        }
    }

    /// Answer a user question against the given corpus.
    pub async fn answer(
        &self,
        question: &str,
        corpus: &Corpus,
        config: PipelineConfig,
    ) -> Result<PipelineOutcome> {
        let start = Instant::now();

        info!("Answering question: {:?}", question);

        let queries = dedup_queries(self.expander.expand(question).await?);
        if queries.is_empty() {
            return Err(FusionError::expansion_failed(
                "expansion returned no queries",
            ));
        }

        debug!("Expanded into {} queries", queries.len());

        let ranking = self.search(&queries, corpus, &config).await?;

        debug!("Fused to {} documents", ranking.len());

        let answer = match self.synthesizer.synthesize(&ranking, &queries).await {
            Ok(text) => text,
            Err(err) if config.synthesis_fallback => {
                warn!("Synthesis failed, showing ranked documents instead: {}", err);
                render_ranking(&ranking, corpus)
            }
            Err(err) => return Err(err),
        };

        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            "Answered in {}ms over {} fused documents",
            latency_ms,
            ranking.len()
        );

        Ok(PipelineOutcome {
            question: question.to_string(),
            queries,
            ranking,
            answer,
            latency_ms,
        })
    }

    /// Retrieve each query concurrently and fuse the result sets.
    ///
    /// Fusion starts only after every retrieval call has completed. Under
    /// [`FailurePolicy::Degrade`] a failed query contributes an empty result
    /// set; under [`FailurePolicy::Abort`] its error is returned as-is.
    pub async fn search(
        &self,
        queries: &[String],
        corpus: &Corpus,
        config: &PipelineConfig,
    ) -> Result<FusedRanking> {
        let corpus = Arc::new(corpus.clone());
        let mut tasks: JoinSet<(usize, Result<RankedResultSet>)> = JoinSet::new();

        for (idx, query) in queries.iter().enumerate() {
            let retriever = Arc::clone(&self.retriever);
            let corpus = Arc::clone(&corpus);
            let query = query.clone();
            tasks.spawn(async move { (idx, retriever.retrieve(&query, &corpus).await) });
        }

        let mut outcomes: Vec<Option<Result<RankedResultSet>>> =
            (0..queries.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (idx, outcome) = joined
                .map_err(|e| FusionError::internal(format!("retrieval task failed: {}", e)))?;
            outcomes[idx] = Some(outcome);
        }

        let mut fusion_input: BTreeMap<String, RankedResultSet> = BTreeMap::new();
        for (query, outcome) in queries.iter().zip(outcomes) {
            let outcome =
                outcome.ok_or_else(|| FusionError::internal("retrieval task never joined"))?;
            match outcome {
                Ok(result_set) => {
                    debug!(
                        "Query {:?} retrieved {} documents",
                        query,
                        result_set.len()
                    );
                    fusion_input.insert(query.clone(), result_set);
                }
                Err(err) => match config.failure_policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Degrade => {
                        warn!(
                            "Retrieval failed for {:?}, fusing an empty result set: {}",
                            query, err
                        );
                        fusion_input.insert(query.clone(), RankedResultSet::new());
                    }
                },
            }
        }

        reciprocal_rank_fusion(&fusion_input, config.rrf_k)
    }
}

/// Drop repeated queries, keeping first occurrences in order.
fn dedup_queries(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|query| seen.insert(query.clone()))
        .collect()
}

/// Render the fused ranking as a plain document list.
///
/// Used when synthesis is unavailable; the ranking itself is still valid.
fn render_ranking(ranking: &FusedRanking, corpus: &Corpus) -> String {
    let mut answer = String::from("Most relevant documents:\n");
    for doc in &ranking.entries {
        match corpus.title(&doc.doc_id) {
            Some(title) => {
                answer.push_str(&format!("{}. {} ({})\n", doc.rank, title, doc.doc_id))
            }
            None => answer.push_str(&format!("{}. {}\n", doc.rank, doc.doc_id)),
        }
    }
    answer
}
