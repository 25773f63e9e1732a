pub mod attributes;
pub mod corpus_item;
pub mod recommendation;

pub use attributes::{AttributeInput, CourseQuery, ProjectQuery};
pub use corpus_item::{CorpusItem, CorpusKind};
pub use recommendation::{CourseRecommendations, ProjectRecommendations, SimilarItem};
