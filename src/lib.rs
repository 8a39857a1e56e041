//! Topic discovery for plain-text document collections.
//!
//! The pipeline runs in four stages, each consuming the complete output of
//! the previous one:
//!
//! 1. [`normalize`]: case folding, punctuation/digit stripping, stopwords.
//! 2. [`dtm`]: sorted vocabulary and a sparse document-term count matrix.
//! 3. [`lda`]: Latent Dirichlet Allocation via collapsed Gibbs sampling.
//! 4. [`report`]: top terms per topic, term frequencies, corpus statistics.
//!
//! [`Pipeline`] strings them together; [`loader`] reads CSV or line-based
//! input for callers that start from a file.
//!
//! ```
//! use lda_pipeline::{Pipeline, PipelineConfig};
//!
//! let docs = [
//!     "Rust ownership and borrowing rules",
//!     "Borrowing rules keep Rust memory safe",
//!     "Gardening tips for tomatoes",
//!     "Tomatoes need sun and water",
//! ];
//! let pipeline = Pipeline::new(PipelineConfig::new(2).max_iterations(100));
//! let output = pipeline.run_texts(&docs).expect("fit should succeed");
//! assert_eq!(output.model.num_topics(), 2);
//! ```

pub mod dtm;
pub mod error;
pub mod lda;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;

pub use dtm::{build_dtm, Corpus, DocumentTermMatrix, PlaceholderPolicy, Vocabulary};
pub use error::{Error, Result};
pub use lda::{fit, fit_with_cancel, CancellationToken, FitParams, MAX_TOPICS};
pub use model::TopicModel;
pub use normalize::{normalize, Normalized, Normalizer, PLACEHOLDER};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
