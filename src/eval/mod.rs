//! Evaluation harness
//!
//! Evaluates retrieval quality against gold document labels and, optionally,
//! the groundedness of generated answers.
//!
//! Dataset format (JSONL), one example per line:
//!
//! ```json
//! {"query": "What are common cost drivers?",
//!  "gold": [{"doc_title": "cost_drivers_101.md", "page": null}],
//!  "k": 6}
//! ```
//!
//! Gold matching rule: a retrieved chunk counts as a hit when its `doc_title`
//! equals a gold item's title exactly and, if the gold item names a page,
//! the pages match too. A `null` page means any page of that document counts.

use crate::error::{Error, Result};
use crate::generation::Generator;
use crate::retrieval::{Retriever, RetrievedItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub mod grounding;
pub mod ranking;

pub use grounding::faithfulness_score;
pub use ranking::{
    average_precision, dcg_at_k, ndcg_at_k, precision_at_k, recall_at_k, reciprocal_rank,
};

/// An expected-relevant document reference for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldItem {
    pub doc_title: String,
    /// `None` means any page of the document counts as relevant
    #[serde(default)]
    pub page: Option<u32>,
}

/// One dataset row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalExample {
    pub query: String,
    #[serde(default)]
    pub gold: Vec<GoldItem>,
    /// Per-example top-k override
    #[serde(default)]
    pub k: Option<usize>,
}

/// Per-example metric values keyed by metric name
pub type MetricsRecord = BTreeMap<String, f64>;

/// One evaluated example: the inputs plus its metric values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleResult {
    pub query: String,
    pub k: usize,
    #[serde(flatten)]
    pub metrics: MetricsRecord,
}

/// Macro-averaged metrics plus per-example detail, in dataset order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(rename = "macro")]
    pub macro_averages: BTreeMap<String, f64>,
    pub results: Vec<ExampleResult>,
}

/// Match retrieved chunks against the gold list
///
/// Position i of the result is true iff retrieved[i] matches some gold item:
/// the first gold item with an exactly equal title whose page is either
/// unset or equal to the retrieved page. Titles are compared without any
/// normalization, and a gold item may satisfy any number of retrieved items.
pub fn match_retrieved_to_gold(retrieved: &[RetrievedItem], gold: &[GoldItem]) -> Vec<bool> {
    retrieved
        .iter()
        .map(|item| {
            gold.iter().any(|g| {
                g.doc_title == item.metadata.doc_title
                    && (g.page.is_none() || g.page == item.metadata.page)
            })
        })
        .collect()
}

/// Runs queries end-to-end and aggregates a dataset into macro averages
///
/// The retrieval and generation collaborators are injected by the caller,
/// which owns their lifecycle. When a collaborator fails, the whole run
/// fails; a silently skipped or zero-scored example would corrupt the macro
/// average without signal.
pub struct Evaluator<'a> {
    retriever: &'a dyn Retriever,
    generator: Option<&'a dyn Generator>,
    default_k: usize,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator that judges retrieval only
    pub fn new(retriever: &'a dyn Retriever, default_k: usize) -> Self {
        Self {
            retriever,
            generator: None,
            default_k,
        }
    }

    /// Also generate an answer per query and judge its groundedness
    pub fn with_generator(mut self, generator: &'a dyn Generator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Evaluate a single query against its gold list
    ///
    /// Retrieves `k` chunks, computes the five ranking metrics with
    /// `total_relevant = gold.len()`, and, when a generator is present,
    /// adds `faithfulness` and `answer_len` (answer word count).
    pub fn evaluate_query(
        &self,
        query: &str,
        gold: &[GoldItem],
        k: usize,
    ) -> Result<MetricsRecord> {
        let retrieved = self.retriever.retrieve(query, k)?;
        let hits = match_retrieved_to_gold(&retrieved, gold);
        let total_relevant = gold.len();

        let mut metrics = MetricsRecord::new();
        metrics.insert("P@k".to_string(), precision_at_k(&hits, k));
        metrics.insert("R@k".to_string(), recall_at_k(&hits, k, total_relevant));
        metrics.insert("MRR".to_string(), reciprocal_rank(&hits));
        metrics.insert("MAP".to_string(), average_precision(&hits));
        metrics.insert("nDCG@k".to_string(), ndcg_at_k(&hits, k));

        if let Some(generator) = self.generator {
            let answer = generator.answer(query, &retrieved)?;
            let texts: Vec<&str> = retrieved.iter().map(|r| r.text.as_str()).collect();
            metrics.insert(
                "faithfulness".to_string(),
                faithfulness_score(&answer.text, &texts),
            );
            metrics.insert(
                "answer_len".to_string(),
                answer.text.split_whitespace().count() as f64,
            );
        }

        Ok(metrics)
    }

    /// Evaluate examples in order and macro-average every metric
    ///
    /// The macro average of a metric is its arithmetic mean across all
    /// examples; an empty dataset yields empty results and an empty macro
    /// map rather than a division error.
    pub fn evaluate(&self, examples: &[EvalExample]) -> Result<EvaluationReport> {
        let mut results = Vec::with_capacity(examples.len());

        for example in examples {
            let k = example.k.unwrap_or(self.default_k);
            let metrics = self.evaluate_query(&example.query, &example.gold, k)?;
            results.push(ExampleResult {
                query: example.query.clone(),
                k,
                metrics,
            });
        }

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for result in &results {
            for (name, value) in &result.metrics {
                *totals.entry(name.clone()).or_insert(0.0) += value;
            }
        }

        let n = results.len().max(1) as f64;
        let macro_averages = totals.into_iter().map(|(name, sum)| (name, sum / n)).collect();

        Ok(EvaluationReport {
            macro_averages,
            results,
        })
    }
}

/// Load a JSONL evaluation dataset
///
/// Blank lines are skipped; any other unparseable line is a fatal error
/// naming the 1-indexed line number, because a silently dropped example
/// would shift the macro average.
pub fn load_dataset(path: &Path) -> Result<Vec<EvalExample>> {
    let file = File::open(path)
        .map_err(|e| Error::Input(format!("cannot open dataset {}: {}", path.display(), e)))?;

    let mut examples = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let example: EvalExample = serde_json::from_str(&line).map_err(|source| Error::Record {
            line: idx + 1,
            source,
        })?;
        examples.push(example);
    }

    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ChunkMetadata;
    use crate::generation::{Answer, Citation, Quiz};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EPS: f64 = 1e-9;

    fn retrieved(title: &str, page: Option<u32>) -> RetrievedItem {
        RetrievedItem {
            text: format!("content of {}", title),
            metadata: ChunkMetadata {
                doc_title: title.to_string(),
                source_path: format!("/notes/{}", title),
                page,
                slide_title: None,
            },
            score: Some(0.8),
        }
    }

    fn gold(title: &str, page: Option<u32>) -> GoldItem {
        GoldItem {
            doc_title: title.to_string(),
            page,
        }
    }

    /// Retriever that replays a canned response per query
    struct StubRetriever {
        responses: Vec<(String, Vec<RetrievedItem>)>,
    }

    impl Retriever for StubRetriever {
        fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedItem>> {
            let items = self
                .responses
                .iter()
                .find(|(q, _)| q == query)
                .map(|(_, items)| items.clone())
                .unwrap_or_default();
            Ok(items.into_iter().take(top_k).collect())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Generator that echoes the first context chunk verbatim
    struct EchoGenerator;

    impl Generator for EchoGenerator {
        fn answer(&self, _question: &str, context: &[RetrievedItem]) -> Result<Answer> {
            let text = context
                .first()
                .map(|c| c.text.clone())
                .unwrap_or_default();
            Ok(Answer {
                text,
                citations: context
                    .iter()
                    .map(|c| Citation {
                        doc_title: c.metadata.doc_title.clone(),
                        page: c.metadata.page,
                        slide_title: c.metadata.slide_title.clone(),
                        source_path: c.metadata.source_path.clone(),
                    })
                    .collect(),
            })
        }

        fn summarize(&self, topic: &str, context: &[RetrievedItem]) -> Result<Answer> {
            self.answer(topic, context)
        }

        fn quiz(&self, _topic: &str, _context: &[RetrievedItem]) -> Result<Quiz> {
            Ok(Quiz {
                questions: Vec::new(),
                raw: None,
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_gold_match_page_agnostic() {
        let hits = match_retrieved_to_gold(&[retrieved("A.md", Some(3))], &[gold("A.md", None)]);
        assert_eq!(hits, vec![true]);
    }

    #[test]
    fn test_gold_match_page_specific() {
        let hits = match_retrieved_to_gold(&[retrieved("A.md", Some(3))], &[gold("A.md", Some(5))]);
        assert_eq!(hits, vec![false]);

        let hits = match_retrieved_to_gold(&[retrieved("A.md", Some(5))], &[gold("A.md", Some(5))]);
        assert_eq!(hits, vec![true]);
    }

    #[test]
    fn test_gold_match_is_case_sensitive() {
        // Deliberately strict provenance: titles must match byte-for-byte.
        let hits = match_retrieved_to_gold(&[retrieved("a.md", None)], &[gold("A.md", None)]);
        assert_eq!(hits, vec![false]);
    }

    #[test]
    fn test_gold_item_matches_multiple_retrieved() {
        let hits = match_retrieved_to_gold(
            &[retrieved("A.md", Some(1)), retrieved("A.md", Some(2))],
            &[gold("A.md", None)],
        );
        assert_eq!(hits, vec![true, true]);
    }

    #[test]
    fn test_gold_match_empty_inputs() {
        assert!(match_retrieved_to_gold(&[], &[gold("A.md", None)]).is_empty());
        assert_eq!(
            match_retrieved_to_gold(&[retrieved("A.md", None)], &[]),
            vec![false]
        );
    }

    #[test]
    fn test_evaluate_query_worked_example() {
        // Retrieval order: miss, hit, miss, hit, miss; gold has 3 entries.
        let stub = StubRetriever {
            responses: vec![(
                "costs".to_string(),
                vec![
                    retrieved("other.md", None),
                    retrieved("fixed.md", None),
                    retrieved("noise.md", None),
                    retrieved("variable.md", None),
                    retrieved("unrelated.md", None),
                ],
            )],
        };
        let gold_list = vec![
            gold("fixed.md", None),
            gold("variable.md", None),
            gold("missing.md", None),
        ];

        let evaluator = Evaluator::new(&stub, 5);
        let metrics = evaluator.evaluate_query("costs", &gold_list, 5).unwrap();

        assert!((metrics["P@k"] - 0.4).abs() < EPS);
        assert!((metrics["R@k"] - 2.0 / 3.0).abs() < EPS);
        assert!((metrics["MRR"] - 0.5).abs() < EPS);
        assert!((metrics["MAP"] - 0.5).abs() < EPS);
        assert!((metrics["nDCG@k"] - 0.6509).abs() < 1e-4);
        assert!(!metrics.contains_key("faithfulness"));
    }

    #[test]
    fn test_evaluate_query_with_generator() {
        let stub = StubRetriever {
            responses: vec![(
                "q".to_string(),
                vec![retrieved("a.md", None), retrieved("b.md", None)],
            )],
        };

        let evaluator = Evaluator::new(&stub, 2).with_generator(&EchoGenerator);
        let metrics = evaluator
            .evaluate_query("q", &[gold("a.md", None)], 2)
            .unwrap();

        // The echoed answer is exactly the first chunk, so the best Jaccard
        // overlap is 1.0 and the top-3 mean averages it with chunk two.
        assert!(metrics["faithfulness"] > 0.5);
        assert!((metrics["answer_len"] - 3.0).abs() < EPS);
    }

    #[test]
    fn test_macro_aggregation() {
        // Example 1: one of two retrieved is relevant (P@2 = 0.5).
        // Example 2: both retrieved are relevant (P@2 = 1.0).
        let stub = StubRetriever {
            responses: vec![
                (
                    "q1".to_string(),
                    vec![retrieved("a.md", None), retrieved("x.md", None)],
                ),
                (
                    "q2".to_string(),
                    vec![retrieved("a.md", Some(1)), retrieved("a.md", Some(2))],
                ),
            ],
        };

        let examples = vec![
            EvalExample {
                query: "q1".to_string(),
                gold: vec![gold("a.md", None)],
                k: None,
            },
            EvalExample {
                query: "q2".to_string(),
                gold: vec![gold("a.md", None)],
                k: None,
            },
        ];

        let evaluator = Evaluator::new(&stub, 2);
        let report = evaluator.evaluate(&examples).unwrap();

        assert_eq!(report.results.len(), 2);
        assert!((report.results[0].metrics["P@k"] - 0.5).abs() < EPS);
        assert!((report.results[1].metrics["P@k"] - 1.0).abs() < EPS);
        assert!((report.macro_averages["P@k"] - 0.75).abs() < EPS);
    }

    #[test]
    fn test_empty_dataset_produces_empty_report() {
        let stub = StubRetriever { responses: vec![] };
        let evaluator = Evaluator::new(&stub, 5);

        let report = evaluator.evaluate(&[]).unwrap();
        assert!(report.results.is_empty());
        assert!(report.macro_averages.is_empty());
    }

    #[test]
    fn test_per_example_k_override() {
        let stub = StubRetriever {
            responses: vec![(
                "q".to_string(),
                vec![retrieved("a.md", None), retrieved("b.md", None)],
            )],
        };

        let examples = vec![EvalExample {
            query: "q".to_string(),
            gold: vec![gold("a.md", None)],
            k: Some(1),
        }];

        let evaluator = Evaluator::new(&stub, 5);
        let report = evaluator.evaluate(&examples).unwrap();

        assert_eq!(report.results[0].k, 1);
        assert!((report.results[0].metrics["P@k"] - 1.0).abs() < EPS);
    }

    #[test]
    fn test_empty_retrieval_yields_zero_metrics() {
        let stub = StubRetriever { responses: vec![] };
        let evaluator = Evaluator::new(&stub, 5);
        let metrics = evaluator
            .evaluate_query("unknown", &[gold("a.md", None)], 5)
            .unwrap();

        assert_eq!(metrics["P@k"], 0.0);
        assert_eq!(metrics["R@k"], 0.0);
        assert_eq!(metrics["MRR"], 0.0);
        assert_eq!(metrics["MAP"], 0.0);
        assert_eq!(metrics["nDCG@k"], 0.0);
    }

    #[test]
    fn test_load_dataset_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"query": "q1", "gold": [{{"doc_title": "a.md", "page": null}}]}}"#)
            .unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"query": "q2", "gold": [], "k": 3}}"#).unwrap();

        let examples = load_dataset(file.path()).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].query, "q1");
        assert_eq!(examples[0].gold.len(), 1);
        assert_eq!(examples[0].gold[0].page, None);
        assert_eq!(examples[1].k, Some(3));
    }

    #[test]
    fn test_load_dataset_rejects_malformed_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"query": "ok", "gold": []}}"#).unwrap();
        writeln!(file, "not json at all").unwrap();

        let err = load_dataset(file.path()).unwrap_err();
        match err {
            Error::Record { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Record error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_dataset_requires_query_field() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"gold": [{{"doc_title": "a.md"}}]}}"#).unwrap();

        assert!(matches!(
            load_dataset(file.path()),
            Err(Error::Record { line: 1, .. })
        ));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/eval.jsonl")).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_report_serialization_shape() {
        let mut metrics = MetricsRecord::new();
        metrics.insert("P@k".to_string(), 0.5);

        let report = EvaluationReport {
            macro_averages: metrics.clone(),
            results: vec![ExampleResult {
                query: "q".to_string(),
                k: 6,
                metrics,
            }],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""macro":{"P@k":0.5}"#));
        // Metric keys are flattened beside query and k.
        assert!(json.contains(r#""query":"q""#));
        assert!(json.contains(r#""k":6"#));
    }
}
