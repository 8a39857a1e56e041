//! Latent Dirichlet Allocation fitted with collapsed Gibbs sampling.
//!
//! Sampling visits documents in row order and, within a document, term
//! occurrences in column order, so a fixed seed reproduces the same chain.

use crate::dtm::{DocumentTermMatrix, Vocabulary};
use crate::error::{Error, Result};
use crate::model::TopicModel;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Largest topic count accepted by [`fit`].
pub const MAX_TOPICS: usize = 1024;

/// Hyperparameters and stopping rule for a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitParams {
    /// Number of topics.
    pub k: usize,
    /// Dirichlet prior on document-topic mixtures.
    pub alpha: f64,
    /// Dirichlet prior on topic-term distributions.
    pub eta: f64,
    pub seed: u64,
    /// Upper bound on Gibbs sweeps.
    pub max_iterations: usize,
    /// Stop early once the relative log-likelihood change between two
    /// evaluations falls below this value. `None` runs the full budget.
    /// Near zero the change is measured in absolute terms.
    pub tolerance: Option<f64>,
    /// Sweeps between log-likelihood evaluations.
    pub eval_every: usize,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            k: 5,
            alpha: 0.1,
            eta: 0.01,
            seed: 1234,
            max_iterations: 800,
            tolerance: None,
            eval_every: 10,
        }
    }
}

impl FitParams {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn eval_every(mut self, n: usize) -> Self {
        self.eval_every = n;
        self
    }

    /// Reject parameters before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.k < 1 || self.k > MAX_TOPICS {
            return Err(Error::InvalidTopicCount {
                k: self.k,
                max: MAX_TOPICS,
            });
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "alpha must be positive, got {}",
                self.alpha
            )));
        }
        if !(self.eta.is_finite() && self.eta > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "eta must be positive, got {}",
                self.eta
            )));
        }
        if let Some(tol) = self.tolerance {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "tolerance must be non-negative, got {}",
                    tol
                )));
            }
        }
        if self.eval_every == 0 {
            return Err(Error::InvalidParameter(
                "eval_every must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Cooperative stop signal shared between a fit and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fit `params.k` topics to `dtm`. Columns of `dtm` are named by `vocabulary`.
pub fn fit(dtm: &DocumentTermMatrix, vocabulary: &Vocabulary, params: &FitParams) -> Result<TopicModel> {
    fit_with_cancel(dtm, vocabulary, params, &CancellationToken::new())
}

/// Like [`fit`], checking `cancel` before every sweep.
pub fn fit_with_cancel(
    dtm: &DocumentTermMatrix,
    vocabulary: &Vocabulary,
    params: &FitParams,
    cancel: &CancellationToken,
) -> Result<TopicModel> {
    params.validate()?;
    if dtm.n_rows() == 0 || dtm.total_count() == 0 {
        return Err(Error::EmptyCorpus);
    }
    if vocabulary.len() != dtm.n_terms() {
        return Err(Error::InvalidParameter(format!(
            "vocabulary has {} terms but the matrix has {} columns",
            vocabulary.len(),
            dtm.n_terms()
        )));
    }
    if params.k > dtm.n_rows() {
        log::warn!(
            "Fitting {} topics to only {} documents",
            params.k,
            dtm.n_rows()
        );
    }

    log::info!(
        "Training LDA (K={}, alpha={}, eta={}, seed={}, max iters={})",
        params.k,
        params.alpha,
        params.eta,
        params.seed,
        params.max_iterations
    );

    let mut sampler = GibbsSampler::new(dtm, params);
    let mut history: Vec<f64> = Vec::new();
    let mut converged = false;
    let mut iterations_run = 0;

    for it in 0..params.max_iterations {
        if cancel.is_cancelled() {
            log::warn!("LDA training cancelled at iteration {}", it);
            return Err(Error::Cancelled { iteration: it });
        }
        sampler.sweep();
        iterations_run = it + 1;

        if (it + 1) % 50 == 0 {
            log::debug!("Training LDA: iteration {}/{}", it + 1, params.max_iterations);
        }

        if iterations_run % params.eval_every == 0 {
            let ll = sampler.log_likelihood();
            let prev = history.last().copied();
            if let (Some(tol), Some(prev)) = (params.tolerance, prev) {
                // relative change, falling back to absolute when |ll| < 1
                let change = (ll - prev).abs() / prev.abs().max(1.0);
                if change < tol {
                    history.push(ll);
                    converged = true;
                    log::info!(
                        "LDA converged after {} iterations (relative change {:.3e})",
                        iterations_run,
                        change
                    );
                    break;
                }
            }
            history.push(ll);
        }
    }

    if history.is_empty() || iterations_run % params.eval_every != 0 {
        history.push(sampler.log_likelihood());
    }
    log::info!(
        "LDA finished after {} iterations, log-likelihood {:.4}",
        iterations_run,
        history.last().copied().unwrap_or_default()
    );

    Ok(TopicModel::new(
        sampler.phi(),
        sampler.theta(),
        vocabulary.terms().to_vec(),
        params.clone(),
        iterations_run,
        converged,
        history,
    ))
}

/// Count tables and topic assignments for one fit. Owned by the fitting
/// call, never shared.
struct GibbsSampler {
    k: usize,
    alpha: f64,
    eta: f64,
    n_terms: usize,

    docs: Vec<Vec<usize>>,  // term id per token position
    z: Vec<Vec<usize>>,     // topic per token position
    ndk: Vec<Vec<usize>>,   // [doc][topic]
    nkw: Vec<Vec<usize>>,   // [topic][term]
    nk: Vec<usize>,         // [topic]

    weights: Vec<f64>,
    rng: StdRng,
}

impl GibbsSampler {
    /// Expand counts into token positions and assign topics uniformly at random.
    fn new(dtm: &DocumentTermMatrix, params: &FitParams) -> Self {
        let k = params.k;
        let n_terms = dtm.n_terms();
        let docs: Vec<Vec<usize>> = (0..dtm.n_rows())
            .map(|d| {
                dtm.row(d)
                    .flat_map(|(w, count)| std::iter::repeat(w).take(count as usize))
                    .collect()
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut ndk = vec![vec![0usize; k]; docs.len()];
        let mut nkw = vec![vec![0usize; n_terms]; k];
        let mut nk = vec![0usize; k];
        let mut z = Vec::with_capacity(docs.len());

        for (di, doc) in docs.iter().enumerate() {
            let mut assignments = Vec::with_capacity(doc.len());
            for &w in doc {
                let topic = rng.gen_range(0..k);
                assignments.push(topic);
                ndk[di][topic] += 1;
                nkw[topic][w] += 1;
                nk[topic] += 1;
            }
            z.push(assignments);
        }

        Self {
            k,
            alpha: params.alpha,
            eta: params.eta,
            n_terms,
            docs,
            z,
            ndk,
            nkw,
            nk,
            weights: vec![0.0; k],
            rng,
        }
    }

    /// One full pass over every token.
    fn sweep(&mut self) {
        let v_eta = self.n_terms as f64 * self.eta;

        for di in 0..self.docs.len() {
            for pi in 0..self.docs[di].len() {
                let w = self.docs[di][pi];
                let old_t = self.z[di][pi];

                self.ndk[di][old_t] -= 1;
                self.nkw[old_t][w] -= 1;
                self.nk[old_t] -= 1;

                // p(t) ∝ (ndk[d][t] + alpha) * (nkw[t][w] + eta) / (nk[t] + V*eta)
                for t in 0..self.k {
                    let left = self.ndk[di][t] as f64 + self.alpha;
                    let right = (self.nkw[t][w] as f64 + self.eta) / (self.nk[t] as f64 + v_eta);
                    self.weights[t] = left * right;
                }

                let new_t = match WeightedIndex::new(&self.weights) {
                    Ok(dist) => dist.sample(&mut self.rng),
                    Err(_) => self.rng.gen_range(0..self.k),
                };

                self.z[di][pi] = new_t;
                self.ndk[di][new_t] += 1;
                self.nkw[new_t][w] += 1;
                self.nk[new_t] += 1;
            }
        }
    }

    /// θ[d][t] = (ndk[d][t] + α) / (N_d + K*α)
    fn theta(&self) -> Vec<Vec<f64>> {
        let k_alpha = self.k as f64 * self.alpha;
        self.ndk
            .iter()
            .zip(&self.docs)
            .map(|(counts, doc)| {
                let denom = doc.len() as f64 + k_alpha;
                counts
                    .iter()
                    .map(|&c| (c as f64 + self.alpha) / denom)
                    .collect()
            })
            .collect()
    }

    /// φ[t][w] = (nkw[t][w] + η) / (nk[t] + V*η)
    fn phi(&self) -> Vec<Vec<f64>> {
        let v_eta = self.n_terms as f64 * self.eta;
        self.nkw
            .iter()
            .zip(&self.nk)
            .map(|(counts, &total)| {
                let denom = total as f64 + v_eta;
                counts
                    .iter()
                    .map(|&c| (c as f64 + self.eta) / denom)
                    .collect()
            })
            .collect()
    }

    /// Σ_d Σ_w n_dw · ln Σ_t θ[d][t] φ[t][w] under the current point estimates.
    fn log_likelihood(&self) -> f64 {
        let theta = self.theta();
        let phi = self.phi();
        let mut ll = 0.0;
        for (di, doc) in self.docs.iter().enumerate() {
            for &w in doc {
                let p: f64 = (0..self.k).map(|t| theta[di][t] * phi[t][w]).sum();
                ll += p.ln();
            }
        }
        ll
    }
}
