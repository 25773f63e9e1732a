use crate::models::CorpusKind;
use crate::services::{
    corpus::{required_columns, Corpus, Table},
    index::{Index, IndexOptions},
    normalizer::{Normalizer, NormalizerKind},
};

fn project_row(name: &str, description: &str) -> [String; 7] {
    [
        name.to_string(),
        description.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
    ]
}

pub(crate) fn project_index(rows: &[(&str, &str)]) -> Index {
    let table = rows.iter().fold(
        Table::new(required_columns(CorpusKind::Projects).iter().copied()),
        |table, (name, description)| table.with_row(project_row(name, description)),
    );
    let corpus = Corpus::from_table(
        &table,
        CorpusKind::Projects,
        Normalizer::new(NormalizerKind::Stem),
    )
    .expect("fixture table is valid");
    Index::build(corpus, &IndexOptions::default()).expect("fixture index builds")
}

pub(crate) fn three_project_index() -> Index {
    project_index(&[
        ("A", "python flask web"),
        ("B", "python django web"),
        ("C", "java spring backend"),
    ])
}

/// Projects whose overlap with "python" decreases with position
pub(crate) fn graded_project_index(len: usize) -> Index {
    let rows: Vec<(String, String)> = (0..len)
        .map(|i| {
            let python = "python ".repeat(len - i);
            (format!("P{i}"), format!("{python}filler{i}x"))
        })
        .collect();
    let borrowed: Vec<(&str, &str)> = rows
        .iter()
        .map(|(name, description)| (name.as_str(), description.as_str()))
        .collect();
    project_index(&borrowed)
}
