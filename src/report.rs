//! Summaries derived from a corpus and a fitted model, ready for export.

use crate::dtm::Corpus;
use crate::model::TopicModel;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Topic id to its top terms, most probable first.
pub type TopTerms = BTreeMap<usize, Vec<(String, f64)>>;

/// The `n` most probable terms of every topic.
///
/// Equal probabilities are ordered by term, so the listing is stable across
/// runs. Asking for more terms than the vocabulary holds returns them all.
pub fn top_terms(model: &TopicModel, n: usize) -> TopTerms {
    let terms = model.terms();
    model
        .beta()
        .iter()
        .enumerate()
        .map(|(t, row)| {
            let mut pairs: Vec<(&str, f64)> = terms
                .iter()
                .map(String::as_str)
                .zip(row.iter().copied())
                .collect();
            pairs.sort_by(|a, b| match b.1.total_cmp(&a.1) {
                Ordering::Equal => a.0.cmp(&b.0),
                other => other,
            });
            let best = pairs
                .into_iter()
                .take(n)
                .map(|(term, p)| (term.to_string(), p))
                .collect();
            (t, best)
        })
        .collect()
}

/// One row of the exported topic table.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicTerm {
    pub topic: usize,
    /// 1-based position within the topic.
    pub rank: usize,
    pub term: String,
    pub probability: f64,
}

/// [`top_terms`] flattened to `(topic, rank, term, probability)` rows.
pub fn topic_table(model: &TopicModel, n: usize) -> Vec<TopicTerm> {
    top_terms(model, n)
        .into_iter()
        .flat_map(|(topic, terms)| {
            terms
                .into_iter()
                .enumerate()
                .map(move |(i, (term, probability))| TopicTerm {
                    topic,
                    rank: i + 1,
                    term,
                    probability,
                })
        })
        .collect()
}

/// Total occurrences of every vocabulary term.
pub fn term_frequencies(corpus: &Corpus) -> BTreeMap<String, u64> {
    corpus
        .vocabulary
        .terms()
        .iter()
        .cloned()
        .zip(corpus.dtm.column_sums())
        .collect()
}

/// [`term_frequencies`] keeping only terms seen at least `min_count` times.
///
/// `min_count = 2` drops every term with frequency ≤ 1.
pub fn term_frequencies_filtered(corpus: &Corpus, min_count: u64) -> BTreeMap<String, u64> {
    term_frequencies(corpus)
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .collect()
}

/// Frequencies ordered by count, highest first, then by term.
pub fn sorted_frequencies(frequencies: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut sorted: Vec<(String, u64)> = frequencies
        .iter()
        .map(|(term, &count)| (term.clone(), count))
        .collect();
    // BTreeMap iteration is already term-ordered and the sort is stable
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// Corpus-level word counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusStats {
    /// Documents given to the DTM constructor.
    pub documents: usize,
    /// Documents left after dropping empty rows.
    pub retained_documents: usize,
    pub total_words: u64,
    pub unique_words: usize,
}

impl CorpusStats {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self {
            documents: corpus.n_documents(),
            retained_documents: corpus.kept_rows.len(),
            total_words: corpus.dtm.total_count(),
            unique_words: corpus.vocabulary.len(),
        }
    }
}

/// θ row of one input document, keyed by its position in the original input.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTopics {
    pub document: usize,
    pub dominant_topic: usize,
    pub probabilities: Vec<f64>,
}

/// θ re-aligned to input positions. Dropped documents are absent.
pub fn document_topic_rows(model: &TopicModel, corpus: &Corpus) -> Vec<DocumentTopics> {
    corpus
        .kept_rows
        .iter()
        .zip(model.theta())
        .zip(model.dominant_topics())
        .map(|((&document, row), dominant_topic)| DocumentTopics {
            document,
            dominant_topic,
            probabilities: row.clone(),
        })
        .collect()
}
