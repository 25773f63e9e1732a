pub mod corpus;
pub mod index;
pub mod normalizer;
pub mod recommendations;
pub mod stopwords;
pub mod vectorizer;

#[cfg(test)]
pub(crate) mod test_support;

pub use corpus::{Corpus, CorpusSource, CsvSource, MemorySource, Table};
pub use index::{Index, IndexOptions, IndexSlot, IndexState, ScoredItem};
pub use normalizer::{Normalizer, NormalizerKind};
pub use recommendations::{recommend_courses, recommend_projects, Recommender};
