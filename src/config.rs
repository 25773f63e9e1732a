use serde::{Deserialize, Deserializer};

use crate::services::normalizer::NormalizerKind;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// CSV table with one row per project
    #[serde(default = "default_project_data_path")]
    pub project_data_path: String,

    /// CSV table with one row per course
    #[serde(default = "default_course_data_path")]
    pub course_data_path: String,

    /// Upper bound on vocabulary size for each fitted index
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Normalization applied to corpus tags and query text (`stem` or `lemmatize`)
    #[serde(
        default = "default_normalizer",
        deserialize_with = "deserialize_normalizer"
    )]
    pub normalizer: NormalizerKind,

    /// Number of recommendations returned when the caller does not ask for a count
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    /// Precompute the pairwise similarity matrix at startup
    #[serde(default = "default_build_similarity_matrix")]
    pub build_similarity_matrix: bool,

    /// Fixed seed for the candidate shuffle; unset means thread RNG
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_project_data_path() -> String {
    "data/projects.csv".to_string()
}

fn default_course_data_path() -> String {
    "data/courses.csv".to_string()
}

fn default_max_features() -> usize {
    1100
}

fn default_normalizer() -> NormalizerKind {
    NormalizerKind::Stem
}

fn default_top_n() -> usize {
    20
}

fn default_build_similarity_matrix() -> bool {
    true
}

fn deserialize_normalizer<'de, D>(deserializer: D) -> Result<NormalizerKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            project_data_path: default_project_data_path(),
            course_data_path: default_course_data_path(),
            max_features: default_max_features(),
            normalizer: default_normalizer(),
            default_top_n: default_top_n(),
            build_similarity_matrix: default_build_similarity_matrix(),
            rng_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_features == 0 {
            anyhow::bail!("MAX_FEATURES must be greater than zero");
        }
        if self.default_top_n == 0 {
            anyhow::bail!("DEFAULT_TOP_N must be greater than zero");
        }
        Ok(())
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
