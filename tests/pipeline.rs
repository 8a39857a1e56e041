//! End-to-end behavior of the normalize → DTM → LDA → report chain.

use approx::assert_abs_diff_eq;
use lda_pipeline::report::{term_frequencies_filtered, top_terms};
use lda_pipeline::{
    build_dtm, fit, normalize, Error, FitParams, Normalized, Normalizer, Pipeline,
    PipelineConfig, PlaceholderPolicy,
};
use std::collections::HashSet;

fn stopwords(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn scenario() -> Normalized {
    Normalizer::new(["the"]).normalize_marked(vec![
        Some("The cat sat."),
        Some("The dog ran."),
        Some(""),
    ])
}

#[test]
fn test_cat_dog_scenario() {
    let normalized = normalize(&["The cat sat.", "The dog ran.", ""], &stopwords(&["the"]));
    assert_eq!(normalized, vec!["cat sat", "dog ran", "placeholder"]);
    assert_eq!(scenario().documents, normalized);

    let corpus = build_dtm(&scenario(), PlaceholderPolicy::Count).unwrap();
    let mut vocab: Vec<&str> = corpus.vocabulary.terms().iter().map(String::as_str).collect();
    vocab.sort();
    assert_eq!(vocab, vec!["cat", "dog", "placeholder", "ran", "sat"]);
    assert_eq!(corpus.dtm.row_sums(), vec![2, 2, 1]);
}

#[test]
fn test_placeholder_rows_can_be_excluded() {
    let corpus = build_dtm(&scenario(), PlaceholderPolicy::Exclude).unwrap();
    assert_eq!(corpus.dtm.row_sums(), vec![2, 2]);
    assert_eq!(corpus.dropped_rows, vec![2]);
}

#[test]
fn test_placeholder_word_in_real_text_survives() {
    let normalized = Normalizer::default().normalize_marked(vec![
        Some("Placeholder text"),
        Some(""),
        Some("dog ran"),
    ]);
    for policy in [PlaceholderPolicy::Count, PlaceholderPolicy::Exclude] {
        let corpus = build_dtm(&normalized, policy).unwrap();
        let row = corpus.kept_rows.iter().position(|&d| d == 0).unwrap();
        assert_eq!(corpus.dtm.row_sum(row), 2);
        assert!(corpus.vocabulary.id("placeholder").is_some());
    }

    for policy in [PlaceholderPolicy::Count, PlaceholderPolicy::Exclude] {
        let config = PipelineConfig::new(1)
            .max_iterations(20)
            .placeholder_policy(policy);
        let output = Pipeline::new(config)
            .run_texts(&["Placeholder!", "placeholder"])
            .unwrap();
        assert_eq!(output.corpus.kept_rows, vec![0, 1]);
        assert_eq!(output.stats.total_words, 2);
    }
}

#[test]
fn test_all_empty_documents() {
    let normalizer = Normalizer::new(["cat"]);
    let normalized =
        normalizer.normalize_marked(vec![Some("The cat."), None, Some("42!"), Some("")]);
    for policy in [PlaceholderPolicy::Count, PlaceholderPolicy::Exclude] {
        let err = build_dtm(&normalized, policy).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }
}

#[test]
fn test_separated_vocabularies_get_distinct_topics() {
    let docs = [
        "alpha beta alpha beta alpha beta alpha beta alpha beta",
        "gamma delta gamma delta gamma delta gamma delta gamma delta",
        "alpha gamma beta delta",
    ];
    let normalized = Normalizer::default().normalize_marked(docs.iter().map(Some));
    let corpus = build_dtm(&normalized, PlaceholderPolicy::Count).unwrap();

    let params = FitParams::new(2).seed(1234).max_iterations(500);
    let model = fit(&corpus.dtm, &corpus.vocabulary, &params).unwrap();

    let dominant = model.dominant_topics();
    assert_ne!(dominant[0], dominant[1]);
    assert!(model.theta()[0][dominant[0]] > 0.6);
    assert!(model.theta()[1][dominant[1]] > 0.6);

    let top = top_terms(&model, 2);
    let mut topic_a: Vec<&str> = top[&dominant[0]].iter().map(|(t, _)| t.as_str()).collect();
    topic_a.sort();
    assert_eq!(topic_a, vec!["alpha", "beta"]);
}

#[test]
fn test_pipeline_is_reproducible() {
    let docs = [
        "Interest rates rise as the central bank fights inflation",
        "The central bank holds interest rates steady",
        "New smartphone features a faster chip and better camera",
        "Camera upgrades headline the smartphone launch event",
        "Inflation data surprises bond markets",
        "",
    ];
    let config = PipelineConfig::new(2).max_iterations(200);

    let a = Pipeline::new(config.clone()).run_texts(&docs).unwrap();
    let b = Pipeline::new(config).run_texts(&docs).unwrap();

    assert_eq!(a.normalized, b.normalized);
    assert_eq!(a.corpus, b.corpus);
    assert_eq!(a.top_terms, b.top_terms);
    for (ra, rb) in a.model.beta().iter().zip(b.model.beta()) {
        for (x, y) in ra.iter().zip(rb) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
    }
    for (ra, rb) in a.model.theta().iter().zip(b.model.theta()) {
        for (x, y) in ra.iter().zip(rb) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
    }

    assert_eq!(a.stats.documents, 6);
    assert_eq!(a.model.theta().len(), a.corpus.dtm.n_rows());
    assert_eq!(a.top_terms.len(), 2);
    assert!(a.top_terms.values().all(|terms| terms.len() == 10));
}

#[test]
fn test_default_configuration_is_reproducible() {
    let docs = [
        "Bitcoin miners expand as the coin price climbs",
        "Ethereum staking rewards draw new validators",
        "Coin price swings unsettle bitcoin traders",
        "Validators debate staking withdrawal rules",
        "Mining difficulty hits a record high",
        "Smart contract audits find token bugs",
    ];
    let config = PipelineConfig::default();
    assert_eq!(config.num_topics, 5);
    assert_eq!(config.seed, 1234);

    let a = Pipeline::new(config.clone()).run_texts(&docs).unwrap();
    let b = Pipeline::new(config).run_texts(&docs).unwrap();

    assert_eq!(a.model.num_topics(), 5);
    assert_eq!(a.corpus.vocabulary, b.corpus.vocabulary);
    assert_eq!(a.model.beta(), b.model.beta());
    assert_eq!(a.model.theta(), b.model.theta());
    assert_eq!(a.top_terms, b.top_terms);
}

#[test]
fn test_frequency_report_drops_singletons() {
    let output = Pipeline::new(PipelineConfig::new(1).max_iterations(20))
        .run_texts(&["red red blue", "blue green", "red"])
        .unwrap();
    let freqs = term_frequencies_filtered(&output.corpus, 2);
    assert_eq!(freqs.get("red"), Some(&3));
    assert_eq!(freqs.get("blue"), Some(&2));
    assert_eq!(freqs.get("green"), None);
}
