//! CSV tables consumed by downstream plotting.

use anyhow::Result;
use lda_pipeline::report::{document_topic_rows, topic_table};
use lda_pipeline::PipelineOutput;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub fn write_all(
    dir: &Path,
    output: &PipelineOutput,
    frequencies: &BTreeMap<String, u64>,
    top_n: usize,
) -> Result<()> {
    fs::create_dir_all(dir)?;
    write_frequencies(&dir.join("term_frequencies.csv"), frequencies)?;
    write_topics(&dir.join("topics.csv"), output, top_n)?;
    write_beta(&dir.join("beta.csv"), output)?;
    write_theta(&dir.join("theta.csv"), output)?;
    write_stats(&dir.join("stats.csv"), output)?;
    Ok(())
}

fn write_frequencies(path: &Path, frequencies: &BTreeMap<String, u64>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["term", "frequency"])?;
    for (term, count) in frequencies {
        wtr.write_record([term.clone(), count.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_topics(path: &Path, output: &PipelineOutput, top_n: usize) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["topic_id", "rank", "term", "probability"])?;
    for row in topic_table(&output.model, top_n) {
        wtr.write_record([
            row.topic.to_string(),
            row.rank.to_string(),
            row.term,
            row.probability.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_beta(path: &Path, output: &PipelineOutput) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["topic_id".to_string()];
    header.extend(output.model.terms().iter().cloned());
    wtr.write_record(&header)?;
    for (topic, row) in output.model.beta().iter().enumerate() {
        let mut record = vec![topic.to_string()];
        record.extend(row.iter().map(f64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_theta(path: &Path, output: &PipelineOutput) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["document".to_string(), "dominant_topic".to_string()];
    header.extend((0..output.model.num_topics()).map(|t| format!("topic_{}", t)));
    wtr.write_record(&header)?;
    for row in document_topic_rows(&output.model, &output.corpus) {
        let mut record = vec![row.document.to_string(), row.dominant_topic.to_string()];
        record.extend(row.probabilities.iter().map(f64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_stats(path: &Path, output: &PipelineOutput) -> Result<()> {
    let stats = &output.stats;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["metric", "value"])?;
    for (metric, value) in [
        ("documents", stats.documents.to_string()),
        ("retained_documents", stats.retained_documents.to_string()),
        ("dropped_documents", output.corpus.dropped_rows.len().to_string()),
        ("total_words", stats.total_words.to_string()),
        ("unique_words", stats.unique_words.to_string()),
        ("iterations", output.model.iterations_run().to_string()),
        ("converged", output.model.converged().to_string()),
    ] {
        wtr.write_record([metric, value.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lda_pipeline::report::term_frequencies;
    use lda_pipeline::{Pipeline, PipelineConfig};
    use tempfile::tempdir;

    fn headers(path: &Path) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_string).collect()
    }

    fn record_count(path: &Path) -> usize {
        csv::Reader::from_path(path).unwrap().records().count()
    }

    #[test]
    fn test_write_all_tables() {
        let output = Pipeline::new(PipelineConfig::new(2).max_iterations(20))
            .run_texts(&["cat sat", "dog ran", "", "cat ran"])
            .unwrap();
        let frequencies = term_frequencies(&output.corpus);
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("results");

        write_all(&out_dir, &output, &frequencies, 3).unwrap();

        assert_eq!(
            headers(&out_dir.join("term_frequencies.csv")),
            vec!["term", "frequency"]
        );
        assert_eq!(
            headers(&out_dir.join("topics.csv")),
            vec!["topic_id", "rank", "term", "probability"]
        );
        assert_eq!(
            headers(&out_dir.join("beta.csv")),
            vec!["topic_id", "cat", "dog", "placeholder", "ran", "sat"]
        );
        assert_eq!(
            headers(&out_dir.join("theta.csv")),
            vec!["document", "dominant_topic", "topic_0", "topic_1"]
        );
        assert_eq!(headers(&out_dir.join("stats.csv")), vec!["metric", "value"]);

        assert_eq!(record_count(&out_dir.join("term_frequencies.csv")), 5);
        assert_eq!(record_count(&out_dir.join("topics.csv")), 6);
        assert_eq!(record_count(&out_dir.join("beta.csv")), 2);
        assert_eq!(record_count(&out_dir.join("theta.csv")), 4);
        assert_eq!(record_count(&out_dir.join("stats.csv")), 7);
    }
}
