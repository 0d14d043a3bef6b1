//! Command-line interface
//!
//! Command bodies for ingest, query, ask, summarize, quiz, and eval. Every
//! command builds its collaborators (embedder, index, generator) from the
//! resolved configuration and wires them together explicitly.

use crate::config::RagConfig;
use crate::data::{chunk_text, CompositeReader};
use crate::embedding::{create_embedder, EmbeddingCache};
use crate::error::Result;
use crate::eval::{load_dataset, Evaluator};
use crate::generation::create_generator;
use crate::retrieval::{Retriever, VectorRetriever};
use crate::store::MemoryIndex;
use std::path::Path;

/// Ingest a directory of notes: read, chunk, embed, index, persist
pub fn ingest(
    config: &RagConfig,
    path: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<()> {
    tracing::info!("Starting ingestion");
    tracing::info!("  Input: {}", path.display());
    tracing::info!("  Chunk size: {} words", chunk_size);
    tracing::info!("  Chunk overlap: {} words", chunk_overlap);

    let reader = CompositeReader::new();
    let records = if path.is_file() {
        reader.read(path)?
    } else {
        reader.read_directory(path)?
    };
    tracing::info!("Extracted {} source records", records.len());

    let mut chunks = Vec::new();
    for record in records {
        for text in chunk_text(&record.text, chunk_size, chunk_overlap) {
            chunks.push(crate::data::Chunk::new(text, record.metadata.clone()));
        }
    }

    if chunks.is_empty() {
        println!("No documents to embed.");
        return Ok(());
    }
    tracing::info!("Created {} chunks", chunks.len());

    let embedder = create_embedder(&config.embedding)?;

    std::fs::create_dir_all(&config.db_dir)?;
    let cache = EmbeddingCache::open(
        &config.db_dir.join("embeddings.db"),
        embedder.model_name().to_string(),
    )?;

    // Embed through the cache so re-ingesting unchanged notes is free.
    let mut embeddings = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let embedding = cache.get_or_compute(&chunk.text, |t| embedder.embed(t))?;
        embeddings.push(embedding);
    }

    let mut index = MemoryIndex::load_or_new(
        &config.db_dir,
        embedder.model_name(),
        embedder.dimension(),
    )?;
    let added = chunks.len();
    index.add(chunks, embeddings)?;
    index.save(&config.db_dir)?;

    tracing::info!("Ingestion complete");

    println!("\nIngestion Summary:");
    println!("  Chunks added: {}", added);
    println!("  Index size: {} chunks", index.len());
    println!("  Index directory: {}", config.db_dir.display());

    Ok(())
}

fn open_retriever(config: &RagConfig) -> Result<VectorRetriever> {
    let embedder = create_embedder(&config.embedding)?;
    let index = MemoryIndex::load(&config.db_dir, embedder.model_name())?;
    Ok(VectorRetriever::new(index, embedder))
}

/// Retrieve and print the top-k chunks for a query
pub fn query(config: &RagConfig, query: &str, top_k: usize) -> Result<()> {
    let retriever = open_retriever(config)?;
    let results = retriever.retrieve(query, top_k)?;

    println!("\nQuery: {}", query);
    println!("Found {} results:\n", results.len());

    for (rank, item) in results.iter().enumerate() {
        let score = item
            .score
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string());
        let page = item
            .metadata
            .page
            .map(|p| format!(" p.{}", p))
            .unwrap_or_default();
        println!(
            "Rank {}: {}{} (score: {})",
            rank + 1,
            item.metadata.doc_title,
            page,
            score
        );
        let preview: String = item.text.chars().take(200).collect();
        println!("  {}", preview);
        if item.text.chars().count() > 200 {
            println!("  ...");
        }
        println!();
    }

    Ok(())
}

/// Answer a question grounded in retrieved context
pub fn ask(config: &RagConfig, question: &str, top_k: usize) -> Result<()> {
    let retriever = open_retriever(config)?;
    let generator = create_generator(&config.generation)?;

    let context = retriever.retrieve(question, top_k)?;
    let answer = generator.answer(question, &context)?;

    println!("\n{}\n", answer.text);
    print_citations(&answer.citations);
    Ok(())
}

/// Summarize a topic from retrieved context
pub fn summarize(config: &RagConfig, topic: &str, top_k: usize) -> Result<()> {
    let retriever = open_retriever(config)?;
    let generator = create_generator(&config.generation)?;

    let context = retriever.retrieve(topic, top_k)?;
    let summary = generator.summarize(topic, &context)?;

    println!("\n{}\n", summary.text);
    print_citations(&summary.citations);
    Ok(())
}

/// Generate a quiz on a topic from retrieved context
pub fn quiz(config: &RagConfig, topic: &str, top_k: usize) -> Result<()> {
    let retriever = open_retriever(config)?;
    let generator = create_generator(&config.generation)?;

    let context = retriever.retrieve(topic, top_k)?;
    let quiz = generator.quiz(topic, &context)?;

    if quiz.questions.is_empty() {
        if let Some(raw) = &quiz.raw {
            println!("\n{}", raw);
        } else {
            println!("\nNo quiz questions generated.");
        }
        return Ok(());
    }

    for (i, q) in quiz.questions.iter().enumerate() {
        println!("\nQ{}: {}", i + 1, q.question);
        for option in &q.options {
            println!("  {}", option);
        }
        println!("  Answer: {}  ({})", q.answer, q.rationale);
    }

    Ok(())
}

fn print_citations(citations: &[crate::generation::Citation]) {
    if citations.is_empty() {
        return;
    }
    println!("Sources:");
    for (i, c) in citations.iter().enumerate() {
        let page = c.page.map(|p| format!(" p.{}", p)).unwrap_or_default();
        println!("  [{}] {}{}", i + 1, c.doc_title, page);
    }
}

/// Evaluate a JSONL dataset and write the detailed report
///
/// Prints the macro-average table to stdout and writes the full report next
/// to the input with a `.results.json` suffix replacing its extension.
pub fn eval(config: &RagConfig, data: &Path, default_k: usize, judge_answer: bool) -> Result<()> {
    tracing::info!("Evaluating dataset {}", data.display());

    let examples = load_dataset(data)?;
    tracing::info!("Loaded {} examples", examples.len());

    let retriever = open_retriever(config)?;

    let report = if judge_answer {
        let generator = create_generator(&config.generation)?;
        Evaluator::new(&retriever, default_k)
            .with_generator(generator.as_ref())
            .evaluate(&examples)?
    } else {
        Evaluator::new(&retriever, default_k).evaluate(&examples)?
    };

    println!("\n== Macro Averages ==");
    let rows: Vec<(&str, f64)> = report
        .macro_averages
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();
    print!("{}", format_table(&rows));

    let out_path = data.with_extension("results.json");
    std::fs::write(&out_path, serde_json::to_string_pretty(&report)?)?;
    println!("\nWrote detailed results -> {}", out_path.display());

    Ok(())
}

/// Align metric names and print values with four decimals
fn format_table(rows: &[(&str, f64)]) -> String {
    let name_width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in rows {
        out.push_str(&format!("{:<width$} : {:.4}\n", name, value, width = name_width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table_alignment() {
        let rows = vec![("MRR", 0.5), ("faithfulness", 0.25)];
        let table = format_table(&rows);
        assert_eq!(table, "MRR          : 0.5000\nfaithfulness : 0.2500\n");
    }

    #[test]
    fn test_format_table_empty() {
        assert_eq!(format_table(&[]), "");
    }

    #[test]
    fn test_results_path_replaces_extension() {
        let path = Path::new("/tmp/eval.jsonl").with_extension("results.json");
        assert_eq!(path, Path::new("/tmp/eval.results.json"));
    }
}
