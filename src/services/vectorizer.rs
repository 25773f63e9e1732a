//! Bag-of-words count vectorization over a bounded vocabulary.

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    services::stopwords::StopWords,
};

/// Splits text into lower-cased runs of word characters at least two characters long
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
}

/// Ordered set of terms defining vector dimensions
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl Vocabulary {
    fn from_terms(mut terms: Vec<String>) -> Self {
        terms.sort();
        let lookup = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        Self { terms, lookup }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.lookup.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.lookup.contains_key(term)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Sparse term-count vector with its L2 norm cached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, u32)>,
    norm: f64,
}

impl SparseVector {
    pub fn from_counts(counts: HashMap<usize, u32>) -> Self {
        let mut entries: Vec<(usize, u32)> = counts.into_iter().filter(|(_, c)| *c > 0).collect();
        entries.sort_unstable_by_key(|(idx, _)| *idx);
        let norm = entries
            .iter()
            .map(|(_, c)| f64::from(*c) * f64::from(*c))
            .sum::<f64>()
            .sqrt();
        Self { entries, norm }
    }

    pub fn entries(&self) -> &[(usize, u32)] {
        &self.entries
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, idx: usize) -> u32 {
        self.entries
            .binary_search_by_key(&idx, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    pub fn to_dense(&self, len: usize) -> Vec<u32> {
        let mut dense = vec![0; len];
        for &(idx, count) in &self.entries {
            if idx < len {
                dense[idx] = count;
            }
        }
        dense
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a) = self.entries[i];
            let (b_idx, b) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += f64::from(a) * f64::from(b);
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// `(a·b) / (‖a‖‖b‖)`, or 0 when either vector is all zeros
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.norm == 0.0 || b.norm == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (a.norm * b.norm)).clamp(0.0, 1.0)
}

/// Unfitted count vectorizer settings
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    max_features: usize,
    stop_words: StopWords,
}

impl CountVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            stop_words: StopWords::english(),
        }
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    /// Keeps the `max_features` most frequent non-stop-word terms; ties go to the lexically smaller term
    pub fn fit<S: AsRef<str>>(self, documents: &[S]) -> AppResult<FittedVectorizer> {
        if documents.is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot fit vectorizer on an empty corpus".to_string(),
            ));
        }

        let mut frequency: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            for token in tokenize(doc.as_ref()) {
                if !self.stop_words.contains(&token) {
                    *frequency.entry(token).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let vocabulary = Vocabulary::from_terms(ranked.into_iter().map(|(term, _)| term).collect());
        if vocabulary.is_empty() {
            return Err(AppError::Schema(
                "Corpus produced an empty vocabulary".to_string(),
            ));
        }

        Ok(FittedVectorizer { vocabulary })
    }

    pub fn fit_transform<S: AsRef<str>>(
        self,
        documents: &[S],
    ) -> AppResult<(FittedVectorizer, Vec<SparseVector>)> {
        let fitted = self.fit(documents)?;
        let vectors = documents
            .iter()
            .map(|doc| fitted.transform(doc.as_ref()))
            .collect();
        Ok((fitted, vectors))
    }
}

/// Vectorizer bound to a fitted vocabulary
#[derive(Debug, Clone)]
pub struct FittedVectorizer {
    vocabulary: Vocabulary,
}

impl FittedVectorizer {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Counts in-vocabulary terms of `text`; unknown terms are dropped
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        SparseVector::from_counts(counts)
    }
}
