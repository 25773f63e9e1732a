use serde::{Deserialize, Serialize};

/// Which catalogue a corpus row belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CorpusKind {
    /// Project ideas with required skills
    Projects,
    /// Online courses with a URL
    Courses,
}

impl CorpusKind {
    pub fn name(&self) -> &'static str {
        match self {
            CorpusKind::Projects => "projects",
            CorpusKind::Courses => "courses",
        }
    }
}

impl std::fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One row of a loaded corpus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusItem {
    /// Row position in the source table
    pub id: usize,
    /// Project or course name
    pub name: String,
    pub description: String,
    /// Required skills for projects, taught skills for courses
    pub skills_required: String,
    /// Course link; projects have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Normalized text that gets vectorized
    #[serde(skip)]
    pub tags: String,
}
