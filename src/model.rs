//! The fitted topic model. Immutable once built.

use crate::dtm::DocumentTermMatrix;
use crate::error::{Error, Result};
use crate::lda::FitParams;

/// β (topics x terms) and θ (documents x topics) with the settings that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicModel {
    beta: Vec<Vec<f64>>,
    theta: Vec<Vec<f64>>,
    terms: Vec<String>,
    params: FitParams,
    iterations_run: usize,
    converged: bool,
    log_likelihood: Vec<f64>,
}

impl TopicModel {
    pub(crate) fn new(
        beta: Vec<Vec<f64>>,
        theta: Vec<Vec<f64>>,
        terms: Vec<String>,
        params: FitParams,
        iterations_run: usize,
        converged: bool,
        log_likelihood: Vec<f64>,
    ) -> Self {
        Self {
            beta,
            theta,
            terms,
            params,
            iterations_run,
            converged,
            log_likelihood,
        }
    }

    /// Topic-term probabilities; row `t` sums to 1.
    pub fn beta(&self) -> &[Vec<f64>] {
        &self.beta
    }

    /// Document-topic probabilities, one row per retained DTM row.
    pub fn theta(&self) -> &[Vec<f64>] {
        &self.theta
    }

    /// Column names of β.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn params(&self) -> &FitParams {
        &self.params
    }

    pub fn num_topics(&self) -> usize {
        self.beta.len()
    }

    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }

    /// True when sampling stopped on the tolerance rather than the budget.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn log_likelihood_history(&self) -> &[f64] {
        &self.log_likelihood
    }

    /// Highest-probability topic per document; ties go to the lower topic id.
    pub fn dominant_topics(&self) -> Vec<usize> {
        self.theta
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (t, &p)| {
                        if p > best.1 {
                            (t, p)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect()
    }

    /// Average θ per topic over all documents.
    pub fn topic_prevalence(&self) -> Vec<f64> {
        let mut prevalence = vec![0.0; self.num_topics()];
        if self.theta.is_empty() {
            return prevalence;
        }
        for row in &self.theta {
            for (t, &p) in row.iter().enumerate() {
                prevalence[t] += p;
            }
        }
        let n = self.theta.len() as f64;
        prevalence.iter_mut().for_each(|p| *p /= n);
        prevalence
    }

    /// exp(-log-likelihood / token count) of `dtm` under θ and β.
    ///
    /// `dtm` must be the matrix the model was fitted on, or at least share
    /// its rows and columns.
    pub fn perplexity(&self, dtm: &DocumentTermMatrix) -> Result<f64> {
        if dtm.n_rows() != self.theta.len() || dtm.n_terms() != self.terms.len() {
            return Err(Error::InvalidParameter(format!(
                "matrix shape {}x{} does not match model shape {}x{}",
                dtm.n_rows(),
                dtm.n_terms(),
                self.theta.len(),
                self.terms.len()
            )));
        }
        let total = dtm.total_count();
        if total == 0 {
            return Err(Error::EmptyCorpus);
        }

        let mut log_likelihood = 0.0;
        for (d, theta_d) in self.theta.iter().enumerate() {
            for (w, count) in dtm.row(d) {
                let p: f64 = theta_d
                    .iter()
                    .zip(&self.beta)
                    .map(|(&theta_dt, beta_t)| theta_dt * beta_t[w])
                    .sum();
                log_likelihood += f64::from(count) * p.ln();
            }
        }
        Ok((-log_likelihood / total as f64).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn toy_model() -> TopicModel {
        TopicModel::new(
            vec![vec![0.7, 0.2, 0.1], vec![0.1, 0.1, 0.8]],
            vec![vec![0.9, 0.1], vec![0.25, 0.75], vec![0.5, 0.5]],
            vec!["a".into(), "b".into(), "c".into()],
            FitParams::new(2),
            10,
            false,
            vec![-12.0],
        )
    }

    #[test]
    fn test_dominant_topics() {
        assert_eq!(toy_model().dominant_topics(), vec![0, 1, 0]);
    }

    #[test]
    fn test_topic_prevalence_sums_to_one() {
        let prevalence = toy_model().topic_prevalence();
        assert_relative_eq!(prevalence[0], 1.65 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(prevalence.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_perplexity() {
        let model = toy_model();
        let dtm = DocumentTermMatrix::from_dense(&[vec![1, 0, 0], vec![0, 0, 1], vec![0, 1, 0]])
            .unwrap();
        let p0: f64 = 0.9 * 0.7 + 0.1 * 0.1;
        let p1: f64 = 0.25 * 0.1 + 0.75 * 0.8;
        let p2: f64 = 0.5 * 0.2 + 0.5 * 0.1;
        let expected = (-(p0.ln() + p1.ln() + p2.ln()) / 3.0).exp();
        assert_relative_eq!(model.perplexity(&dtm).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_perplexity_shape_mismatch() {
        let dtm = DocumentTermMatrix::from_dense(&[vec![1, 0]]).unwrap();
        assert!(toy_model().perplexity(&dtm).is_err());
    }
}
