//! Vocabulary construction and the sparse document-term matrix.
//!
//! Terms get ids in lexicographic order so column layout is a pure function
//! of the corpus. Rows are stored in compressed sparse row form; rows that
//! end up with no terms are dropped and their input positions recorded.

use crate::error::{Error, Result};
use crate::normalize::Normalized;
use std::collections::{BTreeMap, BTreeSet, HashMap};

type TermId = usize;

/// How documents that were replaced by
/// [`PLACEHOLDER`](crate::normalize::PLACEHOLDER) take part in modeling.
///
/// Only positions the normalizer marked as substituted are affected; the same
/// word occurring in real text is always an ordinary term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderPolicy {
    /// The placeholder is an ordinary token with its own column.
    #[default]
    Count,
    /// Substituted documents contribute no tokens and their rows are dropped.
    Exclude,
}

/// Distinct terms of a corpus with stable, sorted ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    /// Build from any term stream; duplicates collapse and ids follow sort order.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = terms.into_iter().map(Into::into).collect();
        let terms: Vec<String> = sorted.into_iter().collect();
        let ids = terms
            .iter()
            .enumerate()
            .map(|(id, term)| (term.clone(), id))
            .collect();
        Self { terms, ids }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id).map(String::as_str)
    }

    /// Terms in id order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Non-negative integer counts, documents by terms, in CSR layout.
///
/// Within a row, column indices are strictly increasing and every stored
/// count is positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTermMatrix {
    n_terms: usize,
    indptr: Vec<usize>,
    indices: Vec<TermId>,
    counts: Vec<u32>,
}

impl DocumentTermMatrix {
    /// An empty matrix with `n_terms` columns and no rows.
    pub fn new(n_terms: usize) -> Self {
        Self {
            n_terms,
            indptr: vec![0],
            indices: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Build from dense rows; zero cells are not stored.
    ///
    /// Every row must have the same length.
    pub fn from_dense(rows: &[Vec<u32>]) -> Result<Self> {
        let n_terms = rows.first().map_or(0, Vec::len);
        let mut dtm = Self::new(n_terms);
        for row in rows {
            if row.len() != n_terms {
                return Err(Error::InvalidParameter(format!(
                    "ragged dense rows: expected {} columns, got {}",
                    n_terms,
                    row.len()
                )));
            }
            dtm.push_sorted_row(
                row.iter()
                    .enumerate()
                    .filter(|(_, &c)| c > 0)
                    .map(|(j, &c)| (j, c)),
            );
        }
        Ok(dtm)
    }

    /// Append a row given as `(column, count)` pairs in increasing column order.
    fn push_sorted_row<I: IntoIterator<Item = (TermId, u32)>>(&mut self, cells: I) {
        for (col, count) in cells {
            debug_assert!(col < self.n_terms);
            if count > 0 {
                self.indices.push(col);
                self.counts.push(count);
            }
        }
        self.indptr.push(self.indices.len());
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    /// Number of stored (non-zero) cells.
    pub fn nnz(&self) -> usize {
        self.counts.len()
    }

    /// Non-zero cells of row `i` as `(column, count)`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (TermId, u32)> + '_ {
        let span = self.indptr[i]..self.indptr[i + 1];
        self.indices[span.clone()]
            .iter()
            .copied()
            .zip(self.counts[span].iter().copied())
    }

    pub fn get(&self, i: usize, j: TermId) -> u32 {
        let span = self.indptr[i]..self.indptr[i + 1];
        match self.indices[span.clone()].binary_search(&j) {
            Ok(pos) => self.counts[span.start + pos],
            Err(_) => 0,
        }
    }

    pub fn row_sum(&self, i: usize) -> u64 {
        self.row(i).map(|(_, c)| u64::from(c)).sum()
    }

    pub fn row_sums(&self) -> Vec<u64> {
        (0..self.n_rows()).map(|i| self.row_sum(i)).collect()
    }

    pub fn column_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_terms];
        for (&col, &count) in self.indices.iter().zip(&self.counts) {
            sums[col] += u64::from(count);
        }
        sums
    }

    pub fn total_count(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn dense_row(&self, i: usize) -> Vec<u32> {
        let mut dense = vec![0u32; self.n_terms];
        for (col, count) in self.row(i) {
            dense[col] = count;
        }
        dense
    }
}

/// Output of [`build_dtm`]: the matrix plus what is needed to read it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    pub dtm: DocumentTermMatrix,
    pub vocabulary: Vocabulary,
    /// Input positions of the rows kept in `dtm`, in row order.
    pub kept_rows: Vec<usize>,
    /// Input positions of documents dropped for having no terms.
    pub dropped_rows: Vec<usize>,
}

impl Corpus {
    /// Number of documents fed to [`build_dtm`].
    pub fn n_documents(&self) -> usize {
        self.kept_rows.len() + self.dropped_rows.len()
    }
}

/// Tokenize normalized documents, build the vocabulary and the count matrix.
///
/// Fails with [`Error::EmptyCorpus`] when no document with real text keeps a
/// term, so a corpus made only of substituted documents is rejected under
/// either policy.
pub fn build_dtm(normalized: &Normalized, policy: PlaceholderPolicy) -> Result<Corpus> {
    let tokenized: Vec<Vec<&str>> = normalized
        .documents
        .iter()
        .enumerate()
        .map(|(doc_idx, doc)| {
            if policy == PlaceholderPolicy::Exclude && normalized.is_substituted(doc_idx) {
                Vec::new()
            } else {
                doc.split_whitespace().collect()
            }
        })
        .collect();

    let vocabulary = Vocabulary::from_terms(tokenized.iter().flatten().copied());

    let mut dtm = DocumentTermMatrix::new(vocabulary.len());
    let mut kept_rows = Vec::new();
    let mut dropped_rows = Vec::new();
    for (doc_idx, tokens) in tokenized.iter().enumerate() {
        if tokens.is_empty() {
            dropped_rows.push(doc_idx);
            continue;
        }
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for tok in tokens {
            if let Some(id) = vocabulary.id(tok) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        dtm.push_sorted_row(counts);
        kept_rows.push(doc_idx);
    }

    if !kept_rows.iter().any(|&doc_idx| !normalized.is_substituted(doc_idx)) {
        log::error!(
            "All {} documents are empty after cleaning",
            normalized.len()
        );
        return Err(Error::EmptyCorpus);
    }

    log::info!(
        "Built DTM: {} documents x {} terms ({} non-zero cells, {} rows dropped)",
        dtm.n_rows(),
        dtm.n_terms(),
        dtm.nnz(),
        dropped_rows.len()
    );

    Ok(Corpus {
        dtm,
        vocabulary,
        kept_rows,
        dropped_rows,
    })
}
