//! Batch orchestration: normalize, build the DTM, fit, summarize.

use crate::dtm::{build_dtm, Corpus, PlaceholderPolicy};
use crate::error::Result;
use crate::lda::{fit_with_cancel, CancellationToken, FitParams};
use crate::model::TopicModel;
use crate::normalize::{Normalized, Normalizer};
use crate::report::{top_terms, CorpusStats, TopTerms};
use std::collections::BTreeSet;

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub num_topics: usize,
    /// Added to the built-in English stopwords.
    pub custom_stopwords: BTreeSet<String>,
    pub seed: u64,
    /// Terms listed per topic.
    pub top_n: usize,
    pub alpha: f64,
    pub eta: f64,
    pub max_iterations: usize,
    pub convergence_tolerance: Option<f64>,
    pub eval_every: usize,
    pub placeholder_policy: PlaceholderPolicy,
    /// Lowest count kept in the term frequency report.
    pub min_term_frequency: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let fit = FitParams::default();
        Self {
            num_topics: fit.k,
            custom_stopwords: BTreeSet::new(),
            seed: fit.seed,
            top_n: 10,
            alpha: fit.alpha,
            eta: fit.eta,
            max_iterations: fit.max_iterations,
            convergence_tolerance: fit.tolerance,
            eval_every: fit.eval_every,
            placeholder_policy: PlaceholderPolicy::default(),
            min_term_frequency: 2,
        }
    }
}

impl PipelineConfig {
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            ..Default::default()
        }
    }

    pub fn stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_stopwords.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn priors(mut self, alpha: f64, eta: f64) -> Self {
        self.alpha = alpha;
        self.eta = eta;
        self
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn convergence_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence_tolerance = Some(tolerance);
        self
    }

    pub fn placeholder_policy(mut self, policy: PlaceholderPolicy) -> Self {
        self.placeholder_policy = policy;
        self
    }

    pub fn min_term_frequency(mut self, min: u64) -> Self {
        self.min_term_frequency = min;
        self
    }

    /// The engine-level view of this configuration.
    pub fn fit_params(&self) -> FitParams {
        FitParams {
            k: self.num_topics,
            alpha: self.alpha,
            eta: self.eta,
            seed: self.seed,
            max_iterations: self.max_iterations,
            tolerance: self.convergence_tolerance,
            eval_every: self.eval_every,
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub normalized: Normalized,
    pub corpus: Corpus,
    pub model: TopicModel,
    pub stats: CorpusStats,
    pub top_terms: TopTerms,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Share `token` with the fitting stage.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage in order. Missing documents (`None`) count as empty.
    pub fn run<I, S>(&self, documents: I) -> Result<PipelineOutput>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        // Reject a bad topic count before touching the documents.
        let params = self.config.fit_params();
        params.validate()?;

        let normalizer = Normalizer::new(&self.config.custom_stopwords);
        let normalized = normalizer.normalize_marked(documents);

        let corpus = build_dtm(&normalized, self.config.placeholder_policy)?;
        let stats = CorpusStats::from_corpus(&corpus);
        log::info!(
            "Corpus: {} documents ({} retained), {} words, {} unique",
            stats.documents,
            stats.retained_documents,
            stats.total_words,
            stats.unique_words
        );

        let model = fit_with_cancel(&corpus.dtm, &corpus.vocabulary, &params, &self.cancel)?;
        let top_terms = top_terms(&model, self.config.top_n);
        log::info!("Extracted top {} terms for {} topics", self.config.top_n, model.num_topics());

        Ok(PipelineOutput {
            normalized,
            corpus,
            model,
            stats,
            top_terms,
        })
    }

    /// [`Pipeline::run`] over plain strings.
    pub fn run_texts<S: AsRef<str>>(&self, documents: &[S]) -> Result<PipelineOutput> {
        self.run(documents.iter().map(Some))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.num_topics, 5);
        assert_eq!(config.seed, 1234);
        assert_eq!(config.top_n, 10);
        assert!(config.custom_stopwords.is_empty());
        assert_eq!(config.placeholder_policy, PlaceholderPolicy::Count);
    }

    #[test]
    fn test_fit_params_mirror_config() {
        let config = PipelineConfig::new(3)
            .seed(9)
            .priors(0.5, 0.05)
            .max_iterations(40)
            .convergence_tolerance(1e-4);
        let params = config.fit_params();
        assert_eq!(params.k, 3);
        assert_eq!(params.seed, 9);
        assert_eq!(params.alpha, 0.5);
        assert_eq!(params.eta, 0.05);
        assert_eq!(params.max_iterations, 40);
        assert_eq!(params.tolerance, Some(1e-4));
    }

    #[test]
    fn test_invalid_topic_count_checked_first() {
        let pipeline = Pipeline::new(PipelineConfig::new(0));
        let err = pipeline.run_texts(&["", ""]).unwrap_err();
        assert!(matches!(err, Error::InvalidTopicCount { .. }));
    }

    #[test]
    fn test_empty_input_is_empty_corpus() {
        let pipeline = Pipeline::new(PipelineConfig::new(2));
        let none: [&str; 0] = [];
        assert!(matches!(pipeline.run_texts(&none), Err(Error::EmptyCorpus)));
        assert!(matches!(
            pipeline.run_texts(&["the and", "of the"]),
            Err(Error::EmptyCorpus)
        ));
    }

    #[test]
    fn test_cancelled_run_produces_no_model() {
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = Pipeline::new(PipelineConfig::new(2)).with_cancellation(token);
        let err = pipeline.run_texts(&["cat sat", "dog ran"]).unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[test]
    fn test_real_placeholder_word_is_modeled() {
        for policy in [PlaceholderPolicy::Count, PlaceholderPolicy::Exclude] {
            let pipeline = Pipeline::new(
                PipelineConfig::new(1)
                    .max_iterations(10)
                    .placeholder_policy(policy),
            );
            let output = pipeline.run_texts(&["Placeholder!", ""]).unwrap();
            assert_eq!(output.normalized.substituted, vec![false, true]);
            assert_eq!(output.corpus.vocabulary.terms(), &["placeholder"]);
            assert_eq!(output.corpus.kept_rows[0], 0);
        }
    }
}
