use anyhow::Result;
use clap::Parser;
use memsearch::{DocumentStatus, ExecutionMode, RequestHistory, SearchEngine};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "In-memory TF-IDF full-text search", long_about = None)]
struct Args {
    /// JSON file with documents to index: [{"id": 0, "text": "...", "ratings": [..]}]
    #[arg(short, long)]
    docs: Option<PathBuf>,

    /// Query to run; prefix a word with '-' to exclude documents containing it
    #[arg(short, long, default_value = "fluffy well-groomed cat")]
    query: String,

    /// Space-separated stop words
    #[arg(short, long, default_value = "a an and in on the with")]
    stop_words: String,

    /// Rank with the data-parallel execution mode
    #[arg(short, long)]
    parallel: bool,
}

// Document structure for JSON input
#[derive(Debug, Deserialize)]
struct DocumentInput {
    id: i32,
    text: String,
    #[serde(default)]
    ratings: Vec<i32>,
}

fn sample_documents() -> Vec<DocumentInput> {
    let texts = [
        "white cat with a fancy collar",
        "fluffy cat fluffy tail",
        "well-groomed dog expressive eyes",
        "well-groomed starling evgeny",
    ];
    let ratings = [vec![8, -3], vec![7, 2, 7], vec![5, -12, 2, 1], vec![9]];

    texts
        .iter()
        .zip(ratings)
        .enumerate()
        .map(|(id, (text, ratings))| DocumentInput {
            id: id as i32,
            text: text.to_string(),
            ratings,
        })
        .collect()
}

fn load_documents(path: &PathBuf) -> Result<Vec<DocumentInput>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let engine = SearchEngine::from_stop_words_text(&args.stop_words)?;

    let docs = match &args.docs {
        Some(path) => load_documents(path)?,
        None => sample_documents(),
    };
    for doc in &docs {
        engine.add_document(doc.id, &doc.text, DocumentStatus::Active, &doc.ratings)?;
    }
    info!(count = engine.document_count(), "indexed documents");

    let mode = if args.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    };

    let mut history = RequestHistory::new(&engine);
    let start = Instant::now();
    let results = match mode {
        ExecutionMode::Sequential => history.add_request(&args.query)?,
        ExecutionMode::Parallel => engine.find_top_documents_with(mode, &args.query)?,
    };
    let elapsed = start.elapsed();

    println!("Query: {:?} ({:?} mode, {:?})", args.query, mode, elapsed);
    if results.is_empty() {
        println!("No matching documents");
    }
    for doc in &results {
        println!("{}", doc);
        if let Some(text) = engine.document_text(doc.id) {
            println!("    {}", text);
        }
    }

    Ok(())
}
