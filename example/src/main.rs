extern crate log;

mod export;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;
use lda_pipeline::loader::load_documents;
use lda_pipeline::report::{sorted_frequencies, term_frequencies_filtered, CorpusStats, TopTerms};
use lda_pipeline::{CancellationToken, Pipeline, PipelineConfig, PlaceholderPolicy};
use std::path::PathBuf;
use std::process::ExitCode;

/// Discover topics in a CSV (first column) or plain-text (one document per line) corpus.
#[derive(Parser, Debug)]
#[command(name = "lda-report", version, about, long_about = None)]
struct Cli {
    /// Input file: .csv uses the first column, anything else one document per line
    input: PathBuf,

    /// Number of topics
    #[arg(short = 'k', long, default_value_t = 5)]
    topics: usize,

    /// Extra stopwords, comma separated
    #[arg(short, long, value_delimiter = ',')]
    stopwords: Vec<String>,

    #[arg(long, default_value_t = 1234)]
    seed: u64,

    /// Terms listed per topic
    #[arg(short = 'n', long, default_value_t = 10)]
    top_n: usize,

    /// Document-topic prior
    #[arg(long, default_value_t = 0.1)]
    alpha: f64,

    /// Topic-term prior
    #[arg(long, default_value_t = 0.01)]
    eta: f64,

    /// Gibbs sampling sweeps
    #[arg(short, long, default_value_t = 800)]
    iterations: usize,

    /// Stop early when the relative log-likelihood change drops below this
    #[arg(long)]
    tolerance: Option<f64>,

    /// Drop documents that were empty after cleaning instead of counting them
    #[arg(long)]
    exclude_placeholders: bool,

    /// Write CSV tables into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Rows shown in the term frequency table
    #[arg(long, default_value_t = 20)]
    show_terms: usize,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let policy = if self.exclude_placeholders {
            PlaceholderPolicy::Exclude
        } else {
            PlaceholderPolicy::Count
        };
        let mut config = PipelineConfig::new(self.topics)
            .stopwords(self.stopwords.iter().cloned())
            .seed(self.seed)
            .top_n(self.top_n)
            .priors(self.alpha, self.eta)
            .max_iterations(self.iterations)
            .placeholder_policy(policy);
        if let Some(tol) = self.tolerance {
            config = config.convergence_tolerance(tol);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let documents = load_documents(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        log::warn!("Could not install Ctrl-C handler: {}", e);
    }

    let config = cli.config();
    let pipeline = Pipeline::new(config.clone()).with_cancellation(cancel);
    let output = pipeline.run(documents).context("topic modeling failed")?;

    println!("{}", stats_table(&output.stats, &output.model));
    let frequencies = term_frequencies_filtered(&output.corpus, config.min_term_frequency);
    println!("{}", frequency_table(&sorted_frequencies(&frequencies), cli.show_terms));
    println!("{}", topics_table(&output.top_terms));

    if let Some(dir) = &cli.output_dir {
        export::write_all(dir, &output, &frequencies, config.top_n)
            .with_context(|| format!("failed to write results to {}", dir.display()))?;
        log::info!("Results written to {}", dir.display());
    }
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.into_iter().map(|h| Cell::new(h).fg(Color::Red)));
    table
}

fn stats_table(stats: &CorpusStats, model: &lda_pipeline::TopicModel) -> Table {
    let mut table = new_table(vec!["Statistic", "Value"]);
    table
        .add_row(vec![Cell::new("Documents"), Cell::new(stats.documents)])
        .add_row(vec![
            Cell::new("Documents modeled"),
            Cell::new(stats.retained_documents),
        ])
        .add_row(vec![Cell::new("Total words"), Cell::new(stats.total_words)])
        .add_row(vec![Cell::new("Unique words"), Cell::new(stats.unique_words)])
        .add_row(vec![
            Cell::new("Iterations"),
            Cell::new(model.iterations_run()),
        ]);
    if let Some(ll) = model.log_likelihood_history().last() {
        table.add_row(vec![
            Cell::new("Log-likelihood"),
            Cell::new(format!("{:.2}", ll)),
        ]);
    }
    table
}

fn frequency_table(frequencies: &[(String, u64)], limit: usize) -> Table {
    let mut table = new_table(vec!["Term", "Frequency"]);
    for (term, count) in frequencies.iter().take(limit) {
        table.add_row(vec![Cell::new(term), Cell::new(count)]);
    }
    table
}

fn topics_table(topics: &TopTerms) -> Table {
    let mut table = new_table(vec!["Topic ID", "Words"]);
    for (topic, words) in topics {
        let words = words
            .iter()
            .map(|(w, p)| format!("{}[{:.3}]", w, p))
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![Cell::new(topic), Cell::new(words)]);
    }
    table
}
