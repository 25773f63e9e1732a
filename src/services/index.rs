//! Immutable recommendation index built once at startup.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{CorpusItem, CorpusKind, SimilarItem},
    services::{
        corpus::Corpus,
        normalizer::Normalizer,
        stopwords::StopWords,
        vectorizer::{cosine_similarity, CountVectorizer, FittedVectorizer, SparseVector, Vocabulary},
    },
};

/// Settings for [`Index::build`]
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub max_features: usize,
    pub stop_words: StopWords,
    pub build_similarity_matrix: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_features: 1100,
            stop_words: StopWords::english(),
            build_similarity_matrix: true,
        }
    }
}

/// Dense row-major matrix of pairwise cosine similarities
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn compute(documents: &[SparseVector]) -> Self {
        let size = documents.len();
        let mut values = vec![0.0; size * size];
        if size > 0 {
            values
                .par_chunks_mut(size)
                .enumerate()
                .for_each(|(row, out)| {
                    for (col, cell) in out.iter_mut().enumerate() {
                        *cell = cosine_similarity(&documents[row], &documents[col]);
                    }
                });
        }
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.size && col < self.size {
            Some(self.values[row * self.size + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.size).then(|| &self.values[row * self.size..(row + 1) * self.size])
    }
}

/// Corpus position with its similarity score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub index: usize,
    pub score: f64,
}

/// Fitted vocabulary, document vectors and corpus rows for one catalogue
#[derive(Debug)]
pub struct Index {
    kind: CorpusKind,
    normalizer: Normalizer,
    items: Vec<CorpusItem>,
    vectorizer: FittedVectorizer,
    documents: Vec<SparseVector>,
    similarity: Option<SimilarityMatrix>,
}

impl Index {
    pub fn build(corpus: Corpus, options: &IndexOptions) -> AppResult<Self> {
        let start = Instant::now();
        let kind = corpus.kind();
        let normalizer = corpus.normalizer();
        let items = corpus.into_items();

        let tags: Vec<&str> = items.iter().map(|item| item.tags.as_str()).collect();
        let (vectorizer, documents) = CountVectorizer::new(options.max_features)
            .with_stop_words(options.stop_words.clone())
            .fit_transform(&tags)?;

        let similarity = options
            .build_similarity_matrix
            .then(|| SimilarityMatrix::compute(&documents));

        tracing::info!(
            corpus = %kind,
            documents = documents.len(),
            vocabulary = vectorizer.vocabulary().len(),
            similarity_matrix = similarity.is_some(),
            elapsed_ms = start.elapsed().as_millis(),
            "Index built"
        );

        Ok(Self {
            kind,
            normalizer,
            items,
            vectorizer,
            documents,
            similarity,
        })
    }

    pub fn kind(&self) -> CorpusKind {
        self.kind
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.vectorizer.vocabulary()
    }

    pub fn items(&self) -> &[CorpusItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn similarity_matrix(&self) -> Option<&SimilarityMatrix> {
        self.similarity.as_ref()
    }

    /// Direct row access, bypassing scoring
    pub fn lookup(&self, index: usize) -> AppResult<&CorpusItem> {
        self.items.get(index).ok_or(AppError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Vectorizes already-normalized text against the fitted vocabulary
    pub fn vectorize(&self, normalized: &str) -> SparseVector {
        self.vectorizer.transform(normalized)
    }

    /// Normalizes then vectorizes raw text
    pub fn query_vector(&self, text: &str) -> SparseVector {
        self.vectorize(&self.normalizer.normalize(text))
    }

    /// Similarity of `query` against every document, in corpus order
    pub fn scores(&self, query: &SparseVector) -> Vec<f64> {
        self.documents
            .iter()
            .map(|doc| cosine_similarity(query, doc))
            .collect()
    }

    /// All documents by descending similarity; equal scores keep corpus order
    pub fn rank(&self, query: &SparseVector) -> Vec<ScoredItem> {
        let mut ranked: Vec<ScoredItem> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .map(|(index, score)| ScoredItem { index, score })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    /// Items most similar to the item at `index`, excluding itself
    pub fn similar_items(&self, index: usize, top_n: usize) -> AppResult<Vec<SimilarItem>> {
        self.lookup(index)?;

        let scores: Vec<f64> = match self.similarity.as_ref().and_then(|m| m.row(index)) {
            Some(row) => row.to_vec(),
            None => self.scores(&self.documents[index]),
        };

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(ranked
            .into_iter()
            .take(top_n)
            .map(|(other, score)| SimilarItem {
                index: other,
                name: self.items[other].name.clone(),
                score,
            })
            .collect())
    }
}

/// Lifecycle of an [`IndexSlot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Uninitialized,
    Building,
    Ready,
}

#[derive(Debug)]
enum SlotState {
    Uninitialized,
    Building,
    Ready(Arc<Index>),
}

/// Process-wide handle to an index that is built exactly once
#[derive(Debug)]
pub struct IndexSlot {
    kind: CorpusKind,
    state: RwLock<SlotState>,
}

impl IndexSlot {
    pub fn new(kind: CorpusKind) -> Self {
        Self {
            kind,
            state: RwLock::new(SlotState::Uninitialized),
        }
    }

    pub fn ready(index: Index) -> Self {
        Self {
            kind: index.kind(),
            state: RwLock::new(SlotState::Ready(Arc::new(index))),
        }
    }

    pub fn kind(&self) -> CorpusKind {
        self.kind
    }

    pub fn state(&self) -> IndexState {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Uninitialized => IndexState::Uninitialized,
            SlotState::Building => IndexState::Building,
            SlotState::Ready(_) => IndexState::Ready,
        }
    }

    /// The built index, or `ModelNotBuilt` while it is not ready
    pub fn get(&self) -> AppResult<Arc<Index>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Ready(index) => Ok(Arc::clone(index)),
            SlotState::Uninitialized | SlotState::Building => Err(AppError::ModelNotBuilt(
                format!("{} index is not ready", self.kind),
            )),
        }
    }

    /// Runs `build` once; later calls return the already-built index
    pub fn build_with<F>(&self, build: F) -> AppResult<Arc<Index>>
    where
        F: FnOnce() -> AppResult<Index>,
    {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if let SlotState::Ready(index) = &*state {
                return Ok(Arc::clone(index));
            }
            if matches!(*state, SlotState::Building) {
                return Err(AppError::Internal(format!(
                    "{} index build already in progress",
                    self.kind
                )));
            }
            *state = SlotState::Building;
        }

        let result = build();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(index) => {
                let index = Arc::new(index);
                *state = SlotState::Ready(Arc::clone(&index));
                Ok(index)
            }
            Err(e) => {
                tracing::error!(corpus = %self.kind, error = %e, "Index build failed");
                *state = SlotState::Uninitialized;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::corpus::{required_columns, Table};
    use crate::services::test_support::three_project_index;

    #[test]
    fn test_python_web_query_ranks_python_projects_first() {
        let index = three_project_index();
        let query = index.query_vector("python web");
        let ranked = index.rank(&query);

        let top_two: Vec<usize> = ranked[..2].iter().map(|s| s.index).collect();
        assert!(top_two.contains(&0));
        assert!(top_two.contains(&1));
        assert_eq!(ranked[2].index, 2);
        assert!(ranked[1].score > ranked[2].score);
    }

    #[test]
    fn test_rank_keeps_corpus_order_for_ties() {
        let index = three_project_index();
        let ranked = index.rank(&index.query_vector("python web"));
        // A and B score identically
        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[1].index, 1);
    }

    #[test]
    fn test_matrix_diagonal_is_one() {
        let index = three_project_index();
        let matrix = index.similarity_matrix().unwrap();
        assert_eq!(matrix.size(), 3);
        for i in 0..3 {
            assert!((matrix.get(i, i).unwrap() - 1.0).abs() < 1e-9);
        }
        assert_eq!(matrix.get(0, 2), Some(0.0));
        assert_eq!(matrix.get(3, 0), None);
    }

    #[test]
    fn test_similar_items_excludes_self() {
        let index = three_project_index();
        let similar = index.similar_items(0, 5).unwrap();
        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].index, 1);
        assert_eq!(similar[0].name, "B");
        assert!(similar.iter().all(|s| s.index != 0));
    }

    #[test]
    fn test_similar_items_without_matrix() {
        let table = Table::new(required_columns(CorpusKind::Projects).iter().copied())
            .with_row(["A", "rust cli", "", "", "", "", ""])
            .with_row(["B", "rust web", "", "", "", "", ""]);
        let corpus =
            Corpus::from_table(&table, CorpusKind::Projects, Normalizer::default()).unwrap();
        let options = IndexOptions {
            build_similarity_matrix: false,
            ..IndexOptions::default()
        };
        let index = Index::build(corpus, &options).unwrap();
        assert!(index.similarity_matrix().is_none());
        let similar = index.similar_items(1, 1).unwrap();
        assert_eq!(similar[0].index, 0);
        assert!((similar[0].score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let index = three_project_index();
        assert_eq!(index.lookup(2).unwrap().name, "C");
        assert!(matches!(
            index.lookup(3),
            Err(AppError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(index.similar_items(10, 3).is_err());
    }

    #[test]
    fn test_slot_lifecycle() {
        let slot = IndexSlot::new(CorpusKind::Projects);
        assert_eq!(slot.state(), IndexState::Uninitialized);
        assert!(matches!(slot.get(), Err(AppError::ModelNotBuilt(_))));

        let built = slot.build_with(|| Ok(three_project_index())).unwrap();
        assert_eq!(slot.state(), IndexState::Ready);
        assert_eq!(built.len(), 3);

        // second build is a no-op
        let again = slot
            .build_with(|| panic!("index must not be rebuilt"))
            .unwrap();
        assert!(Arc::ptr_eq(&built, &again));
    }

    #[test]
    fn test_slot_failed_build_resets_state() {
        let slot = IndexSlot::new(CorpusKind::Courses);
        let result = slot.build_with(|| Err(AppError::DataNotFound("courses.csv".to_string())));
        assert!(matches!(result, Err(AppError::DataNotFound(_))));
        assert_eq!(slot.state(), IndexState::Uninitialized);
    }
}
