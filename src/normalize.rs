//! Text cleaning ahead of tokenization.
//!
//! A [`Normalizer`] folds case, strips everything that is not a letter or
//! whitespace, collapses runs of whitespace and drops stopwords. Missing or
//! blank documents are replaced by [`PLACEHOLDER`] so every input position
//! survives into the document-term stage; [`Normalized`] records which
//! positions were replaced so later stages never confuse the substitute with
//! the same word in real text.

use std::collections::HashSet;

/// Substituted for documents that are missing or have no letters left.
pub const PLACEHOLDER: &str = "placeholder";

/// Built-in English stopword list.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "would",
    "should", "could", "ought", "a", "an", "the", "and", "but", "if", "or", "because", "as",
    "until", "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down", "in",
    "out", "on", "off", "over", "under", "again", "further", "then", "once", "here", "there",
    "when", "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
];

/// Normalized documents in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub documents: Vec<String>,
    /// `true` where the input was missing or blank and got [`PLACEHOLDER`].
    pub substituted: Vec<bool>,
}

impl Normalized {
    /// Wrap text that is already normalized. No position counts as substituted.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents: Vec<String> = texts.into_iter().map(Into::into).collect();
        let substituted = vec![false; documents.len()];
        Self {
            documents,
            substituted,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn is_substituted(&self, i: usize) -> bool {
        self.substituted.get(i).copied().unwrap_or(false)
    }
}

/// Cleans raw documents with a stopword set merged once at construction.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: HashSet<String>,
}

impl Normalizer {
    /// Built-in English stopwords plus `extra_stopwords`.
    ///
    /// Extra words go through the same cleaning as documents, so `"Don't"`
    /// matches the token `dont`.
    pub fn new<I, S>(extra_stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stopwords: HashSet<String> =
            ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect();
        stopwords.extend(
            extra_stopwords
                .into_iter()
                .map(|w| clean_text(w.as_ref()))
                .filter(|w| !w.is_empty()),
        );
        Self { stopwords }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Normalize one document. `None` is treated like an empty string.
    pub fn normalize_document(&self, doc: Option<&str>) -> String {
        self.normalize_one(doc).0
    }

    /// The normalized text and whether the placeholder was substituted.
    fn normalize_one(&self, doc: Option<&str>) -> (String, bool) {
        let cleaned = doc.map(clean_text).unwrap_or_default();
        let substituted = cleaned.is_empty();
        let text = if substituted {
            PLACEHOLDER
        } else {
            cleaned.as_str()
        };

        let kept = text
            .split(' ')
            .filter(|tok| !tok.is_empty() && !self.stopwords.contains(*tok))
            .collect::<Vec<_>>()
            .join(" ");
        (kept, substituted)
    }

    /// Normalize a whole collection, preserving order and count.
    pub fn normalize<I, S>(&self, documents: I) -> Vec<String>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        self.normalize_marked(documents).documents
    }

    /// [`Normalizer::normalize`] that also reports substituted positions.
    pub fn normalize_marked<I, S>(&self, documents: I) -> Normalized
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let (documents, substituted): (Vec<String>, Vec<bool>) = documents
            .into_iter()
            .map(|doc| self.normalize_one(doc.as_ref().map(|d| d.as_ref())))
            .unzip();

        let blank = documents.iter().filter(|d| d.is_empty()).count();
        let replaced = substituted.iter().filter(|&&s| s).count();
        log::info!(
            "Normalized {} documents ({} placeholders, {} empty after stopword removal)",
            documents.len(),
            replaced,
            blank
        );
        Normalized {
            documents,
            substituted,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

/// Convenience wrapper over [`Normalizer`] for plain string slices.
pub fn normalize<S: AsRef<str>>(documents: &[S], extra_stopwords: &HashSet<String>) -> Vec<String> {
    Normalizer::new(extra_stopwords).normalize(documents.iter().map(Some))
}

/// Lowercase, keep only letters and whitespace, collapse whitespace and trim.
///
/// Characters without a lowercase mapping that still report as uppercase are
/// dropped along with digits, punctuation and symbols.
fn clean_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_alphabetic() && !c.is_uppercase() {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  The Cat,  sat!\n\t42 times. "), "the cat sat times");
        assert_eq!(clean_text("don't stop"), "dont stop");
        assert_eq!(clean_text("1234 !!! ..."), "");
    }

    #[test]
    fn test_scenario_documents() {
        let extra: HashSet<String> = ["the".to_string()].into_iter().collect();
        let out = normalize(&["The cat sat.", "The dog ran.", ""], &extra);
        assert_eq!(out, vec!["cat sat", "dog ran", "placeholder"]);
    }

    #[test]
    fn test_missing_document_becomes_placeholder() {
        let normalizer = Normalizer::default();
        let docs: Vec<Option<&str>> = vec![None, Some("..."), Some("Rust rocks")];
        assert_eq!(
            normalizer.normalize(docs),
            vec!["placeholder", "placeholder", "rust rocks"]
        );
    }

    #[test]
    fn test_stopword_only_document_stays_empty() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.normalize_document(Some("The and OF the")), "");
    }

    #[test]
    fn test_custom_stopwords_are_case_insensitive() {
        let normalizer = Normalizer::new(["Bitcoin", " ETH "]);
        assert!(normalizer.is_stopword("bitcoin"));
        assert!(normalizer.is_stopword("eth"));
        assert_eq!(
            normalizer.normalize_document(Some("BITCOIN and Eth prices")),
            "prices"
        );
    }

    #[test]
    fn test_custom_stopwords_are_cleaned() {
        let normalizer = Normalizer::new(["Don't", "C3PO!"]);
        assert!(normalizer.is_stopword("dont"));
        assert!(normalizer.is_stopword("cpo"));
        assert_eq!(normalizer.normalize_document(Some("Don't stop")), "stop");
    }

    #[test]
    fn test_marks_substituted_positions() {
        let normalizer = Normalizer::default();
        let docs = vec![Some("Placeholder text"), Some(""), None, Some("dog ran")];
        let out = normalizer.normalize_marked(docs);
        assert_eq!(
            out.documents,
            vec!["placeholder text", "placeholder", "placeholder", "dog ran"]
        );
        assert_eq!(out.substituted, vec![false, true, true, false]);
        assert!(out.is_substituted(1));
        assert!(!out.is_substituted(0));
        assert!(!out.is_substituted(9));
    }

    #[test]
    fn test_filtered_placeholder() {
        let normalizer = Normalizer::new([PLACEHOLDER]);
        assert_eq!(normalizer.normalize_document(None), "");
    }

    #[test]
    fn test_output_alphabet() {
        let normalizer = Normalizer::default();
        let out = normalizer.normalize_document(Some("Ärger über Ölpreise: +5% (2024)!"));
        assert_eq!(out, "ärger über ölpreise");
        assert!(!out.chars().any(|c| c.is_uppercase() || c.is_numeric()));
    }
}
