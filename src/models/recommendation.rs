use serde::Serialize;

use super::CorpusItem;

/// Project recommendations as parallel arrays of equal length
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProjectRecommendations {
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
    pub skills: Vec<String>,
    pub indices: Vec<usize>,
}

impl ProjectRecommendations {
    pub fn push(&mut self, item: &CorpusItem) {
        self.names.push(item.name.clone());
        self.descriptions.push(item.description.clone());
        self.skills.push(item.skills_required.clone());
        self.indices.push(item.id);
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl<'a> FromIterator<&'a CorpusItem> for ProjectRecommendations {
    fn from_iter<I: IntoIterator<Item = &'a CorpusItem>>(iter: I) -> Self {
        let mut out = Self::default();
        for item in iter {
            out.push(item);
        }
        out
    }
}

/// Course recommendations as parallel arrays of equal length
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CourseRecommendations {
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
    pub urls: Vec<String>,
    pub indices: Vec<usize>,
}

impl CourseRecommendations {
    pub fn push(&mut self, item: &CorpusItem) {
        self.names.push(item.name.clone());
        self.descriptions.push(item.description.clone());
        self.urls.push(item.url.clone().unwrap_or_default());
        self.indices.push(item.id);
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl<'a> FromIterator<&'a CorpusItem> for CourseRecommendations {
    fn from_iter<I: IntoIterator<Item = &'a CorpusItem>>(iter: I) -> Self {
        let mut out = Self::default();
        for item in iter {
            out.push(item);
        }
        out
    }
}

/// Corpus item paired with its similarity to a reference item
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimilarItem {
    pub index: usize,
    pub name: String,
    pub score: f64,
}
