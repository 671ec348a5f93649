//! Naive-Bayes document classifier with add-one smoothed word presence.
//!
//! Each document is reduced to the set of whitespace-delimited words it
//! contains. For category `c` with `n_c` training documents, a word seen in
//! `k` of them gets
//!
//! ```text
//! log P(w | c) = ln(k + 1) - ln(n_c + 2)
//! ```
//!
//! and a word never seen in `c` gets `-ln(n_c + 2)`. Classification sums
//! log-odds of the first category against the second over the union
//! vocabulary: present words contribute `log q - log p`, absent words
//! contribute `log(1 - q) - log(1 - p)`. Non-negative odds pick the first
//! category.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use trellis_math::log1m_exp;

/// Errors from classifier training and evaluation.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("category {label} has no training documents")]
    EmptyCategory { label: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClassifyError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ClassifyError::EmptyCategory { .. } => 80,
            ClassifyError::Io { .. } => 81,
        }
    }
}

/// Which of the two trained categories a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    First,
    Second,
}

impl Category {
    pub fn index(self) -> usize {
        match self {
            Category::First => 0,
            Category::Second => 1,
        }
    }
}

/// Split a document into its set of distinct words.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Smoothed per-word log-likelihoods for one category.
#[derive(Debug, Clone)]
struct WordTable {
    log_probs: HashMap<String, f64>,
    unseen: f64,
}

impl WordTable {
    fn train(documents: &[BTreeSet<String>]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            for word in doc {
                *counts.entry(word.as_str()).or_default() += 1;
            }
        }

        let denom = ((documents.len() + 2) as f64).ln();
        let log_probs = counts
            .into_iter()
            .map(|(word, k)| (word.to_string(), ((k + 1) as f64).ln() - denom))
            .collect();
        Self {
            log_probs,
            unseen: -denom,
        }
    }

    fn log_prob(&self, word: &str) -> f64 {
        self.log_probs.get(word).copied().unwrap_or(self.unseen)
    }
}

/// A trained two-category classifier.
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    labels: [String; 2],
    tables: [WordTable; 2],
    log_priors: [f64; 2],
    vocabulary: BTreeSet<String>,
}

impl NaiveBayes {
    /// Train from tokenized documents of each category.
    pub fn train(
        labels: [&str; 2],
        documents: [&[BTreeSet<String>]; 2],
    ) -> Result<Self, ClassifyError> {
        for (label, docs) in labels.iter().zip(documents.iter()) {
            if docs.is_empty() {
                return Err(ClassifyError::EmptyCategory {
                    label: label.to_string(),
                });
            }
        }

        let total = (documents[0].len() + documents[1].len()) as f64;
        let log_priors = [
            (documents[0].len() as f64 / total).ln(),
            (documents[1].len() as f64 / total).ln(),
        ];
        let tables = [WordTable::train(documents[0]), WordTable::train(documents[1])];
        let vocabulary = tables
            .iter()
            .flat_map(|t| t.log_probs.keys().cloned())
            .collect();

        Ok(Self {
            labels: [labels[0].to_string(), labels[1].to_string()],
            tables,
            log_priors,
            vocabulary,
        })
    }

    /// Train from raw document text.
    pub fn train_texts<T: AsRef<str>>(
        labels: [&str; 2],
        first: &[T],
        second: &[T],
    ) -> Result<Self, ClassifyError> {
        let first: Vec<_> = first.iter().map(|t| tokenize(t.as_ref())).collect();
        let second: Vec<_> = second.iter().map(|t| tokenize(t.as_ref())).collect();
        Self::train(labels, [first.as_slice(), second.as_slice()])
    }

    pub fn label(&self, category: Category) -> &str {
        &self.labels[category.index()]
    }

    pub fn log_priors(&self) -> [f64; 2] {
        self.log_priors
    }

    /// Number of distinct words seen in training.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Smoothed `log P(word | category)`.
    pub fn log_likelihood(&self, category: Category, word: &str) -> f64 {
        self.tables[category.index()].log_prob(word)
    }

    /// `ln P(first | doc) - ln P(second | doc)`.
    pub fn log_odds(&self, document: &BTreeSet<String>) -> f64 {
        let [first, second] = &self.tables;
        let mut odds = self.log_priors[0] - self.log_priors[1];
        for word in &self.vocabulary {
            let log_q = first.log_prob(word);
            let log_p = second.log_prob(word);
            if document.contains(word) {
                odds += log_q - log_p;
            } else {
                odds += log1m_exp(log_q) - log1m_exp(log_p);
            }
        }
        odds
    }

    /// Pick a category for a tokenized document.
    pub fn classify(&self, document: &BTreeSet<String>) -> Category {
        if self.log_odds(document) >= 0.0 {
            Category::First
        } else {
            Category::Second
        }
    }

    /// Tokenize and classify raw text.
    pub fn classify_text(&self, text: &str) -> Category {
        self.classify(&tokenize(text))
    }
}

/// Outcome for one evaluated file.
#[derive(Debug, Clone, Serialize)]
pub struct FileVerdict {
    pub path: PathBuf,
    pub actual: Category,
    pub predicted: Category,
}

/// Confusion matrix over a labelled test directory.
///
/// Rows are the true category, columns the predicted one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evaluation {
    pub confusion: [[usize; 2]; 2],
    pub files: Vec<FileVerdict>,
}

impl Evaluation {
    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.confusion[0][0] + self.confusion[1][1]
    }

    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            n => Some(self.correct() as f64 / n as f64),
        }
    }
}

/// Train from two directories of documents, one file per document.
pub fn train_from_dirs(
    labels: [&str; 2],
    first_dir: &Path,
    second_dir: &Path,
) -> Result<NaiveBayes, ClassifyError> {
    let first = read_documents(first_dir)?;
    let second = read_documents(second_dir)?;
    let docs_first: Vec<_> = first.into_iter().map(|(_, d)| d).collect();
    let docs_second: Vec<_> = second.into_iter().map(|(_, d)| d).collect();
    let model = NaiveBayes::train(labels, [docs_first.as_slice(), docs_second.as_slice()])?;
    info!(
        first = docs_first.len(),
        second = docs_second.len(),
        vocabulary = model.vocabulary_size(),
        "classifier trained"
    );
    Ok(model)
}

/// Classify every file in `test_dir`. A file's true category is the second
/// one when its name contains the second label, otherwise the first.
pub fn evaluate(model: &NaiveBayes, test_dir: &Path) -> Result<Evaluation, ClassifyError> {
    let mut evaluation = Evaluation::default();
    let second_label = model.label(Category::Second).to_string();

    for (path, document) in read_documents(test_dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let actual = if name.contains(&second_label) {
            Category::Second
        } else {
            Category::First
        };
        let predicted = model.classify(&document);
        evaluation.confusion[actual.index()][predicted.index()] += 1;
        debug!(file = %path.display(), ?actual, ?predicted, "classified");
        evaluation.files.push(FileVerdict {
            path,
            actual,
            predicted,
        });
    }
    Ok(evaluation)
}

/// Regular files of `dir` in name order, tokenized. Non-UTF-8 bytes are
/// replaced rather than rejected.
fn read_documents(dir: &Path) -> Result<Vec<(PathBuf, BTreeSet<String>)>, ClassifyError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ClassifyError::Io { path, source }
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
        let entry = entry.map_err(io_err(dir))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(&path).map_err(io_err(&path))?;
        let document = tokenize(&String::from_utf8_lossy(&bytes));
        documents.push((path, document));
    }
    Ok(documents)
}
