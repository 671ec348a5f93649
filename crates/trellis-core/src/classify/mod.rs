//! Two-category Naive-Bayes text classification over word presence.

pub mod naive_bayes;

pub use naive_bayes::{
    evaluate, tokenize, train_from_dirs, Category, ClassifyError, Evaluation, FileVerdict,
    NaiveBayes,
};
