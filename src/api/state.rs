use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    models::CorpusKind,
    services::{
        stopwords::StopWords, Corpus, CsvSource, Index, IndexOptions, IndexSlot, Normalizer,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub projects: Arc<IndexSlot>,
    pub courses: Arc<IndexSlot>,
    pub settings: Arc<RequestSettings>,
}

/// Per-request defaults taken from configuration
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub default_top_n: usize,
    pub rng_seed: Option<u64>,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            default_top_n: 20,
            rng_seed: None,
        }
    }
}

impl From<&Config> for RequestSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_top_n: config.default_top_n,
            rng_seed: config.rng_seed,
        }
    }
}

impl AppState {
    /// State with both indices still unbuilt
    pub fn new(settings: RequestSettings) -> Self {
        Self {
            projects: Arc::new(IndexSlot::new(CorpusKind::Projects)),
            courses: Arc::new(IndexSlot::new(CorpusKind::Courses)),
            settings: Arc::new(settings),
        }
    }

    /// State around indices that are already built
    pub fn with_indices(projects: Index, courses: Index, settings: RequestSettings) -> Self {
        Self {
            projects: Arc::new(IndexSlot::ready(projects)),
            courses: Arc::new(IndexSlot::ready(courses)),
            settings: Arc::new(settings),
        }
    }

    /// Loads both corpora from the configured CSV files and builds their indices
    pub fn build_indices(&self, config: &Config) -> AppResult<()> {
        let options = IndexOptions {
            max_features: config.max_features,
            stop_words: StopWords::english(),
            build_similarity_matrix: config.build_similarity_matrix,
        };
        let normalizer = Normalizer::new(config.normalizer);

        self.projects.build_with(|| {
            let source = CsvSource::new(&config.project_data_path);
            let corpus = Corpus::load(&source, CorpusKind::Projects, normalizer)?;
            Index::build(corpus, &options)
        })?;

        self.courses.build_with(|| {
            let source = CsvSource::new(&config.course_data_path);
            let corpus = Corpus::load(&source, CorpusKind::Courses, normalizer)?;
            Index::build(corpus, &options)
        })?;

        Ok(())
    }
}
