use serde::Deserialize;

/// A user attribute as sent by clients: either a comma-separated string or a list
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AttributeInput {
    Text(String),
    List(Vec<String>),
}

impl AttributeInput {
    /// Splits text input on commas; list input is taken as-is
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            AttributeInput::Text(text) => text.split(',').map(str::to_string).collect(),
            AttributeInput::List(items) => items,
        }
    }
}

fn group(input: Option<AttributeInput>) -> Option<Vec<String>> {
    input.map(AttributeInput::into_tokens)
}

/// Attribute groups describing a user for project recommendations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectQuery {
    #[serde(default)]
    pub skills: Option<AttributeInput>,
    #[serde(default)]
    pub framework: Option<AttributeInput>,
    #[serde(default)]
    pub tools: Option<AttributeInput>,
    #[serde(default)]
    pub category: Option<AttributeInput>,
    #[serde(default)]
    pub domain: Option<AttributeInput>,
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl ProjectQuery {
    /// Attribute groups in skills, framework, tools, category, domain order
    pub fn into_groups(self) -> Vec<Option<Vec<String>>> {
        vec![
            group(self.skills),
            group(self.framework),
            group(self.tools),
            group(self.category),
            group(self.domain),
        ]
    }
}

/// Attribute groups describing a user for course recommendations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseQuery {
    #[serde(default)]
    pub skills: Option<AttributeInput>,
    #[serde(default)]
    pub domain: Option<AttributeInput>,
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl CourseQuery {
    pub fn into_groups(self) -> Vec<Option<Vec<String>>> {
        vec![group(self.skills), group(self.domain)]
    }
}
