//! Loading project and course tables into normalized corpus rows.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::{
    error::{AppError, AppResult},
    models::{CorpusItem, CorpusKind},
    services::normalizer::Normalizer,
};

pub const PROJECT_NAME: &str = "Project Name";
pub const PROJECT_DESCRIPTION: &str = "Project Description";
pub const PROJECT_SKILLS: &str = "Skills Required";
pub const PROJECT_FRAMEWORK: &str = "Framework";
pub const PROJECT_TOOLS: &str = "Tools & Technologies";
pub const PROJECT_CATEGORY: &str = "Categorized Category";
pub const PROJECT_DOMAIN: &str = "Categorized Domain";

pub const COURSE_NAME: &str = "Course Name";
pub const COURSE_DIFFICULTY: &str = "Difficulty Level";
pub const COURSE_DESCRIPTION: &str = "Course Description";
pub const COURSE_SKILLS: &str = "Skills";
pub const COURSE_URL: &str = "Course URL";

const PROJECT_COLUMNS: &[&str] = &[
    PROJECT_NAME,
    PROJECT_DESCRIPTION,
    PROJECT_SKILLS,
    PROJECT_FRAMEWORK,
    PROJECT_TOOLS,
    PROJECT_CATEGORY,
    PROJECT_DOMAIN,
];

const COURSE_COLUMNS: &[&str] = &[
    COURSE_NAME,
    COURSE_DIFFICULTY,
    COURSE_DESCRIPTION,
    COURSE_SKILLS,
    COURSE_URL,
];

/// Columns a table must carry to be loaded as `kind`
pub fn required_columns(kind: CorpusKind) -> &'static [&'static str] {
    match kind {
        CorpusKind::Projects => PROJECT_COLUMNS,
        CorpusKind::Courses => COURSE_COLUMNS,
    }
}

/// Raw tabular data: a header row plus string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<H, S>(headers: H) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row<R, S>(mut self, row: R) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

/// Backing store for a corpus table
#[cfg_attr(test, mockall::automock)]
pub trait CorpusSource: Send + Sync {
    fn read_table(&self) -> AppResult<Table>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Reads a table from a CSV file with a header row
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CorpusSource for CsvSource {
    fn read_table(&self) -> AppResult<Table> {
        if !self.path.is_file() {
            return Err(AppError::DataNotFound(format!(
                "Data file not found at {}",
                self.path.display()
            )));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Table { headers, rows })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serves a table already held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    table: Table,
}

impl MemorySource {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

impl CorpusSource for MemorySource {
    fn read_table(&self) -> AppResult<Table> {
        Ok(self.table.clone())
    }

    fn describe(&self) -> String {
        "in-memory table".to_string()
    }
}

/// Ordered corpus rows with their normalized tags
#[derive(Debug, Clone)]
pub struct Corpus {
    kind: CorpusKind,
    normalizer: Normalizer,
    items: Vec<CorpusItem>,
}

impl Corpus {
    /// Loads `source` as a corpus of `kind`, deriving tags with `normalizer`
    pub fn load(
        source: &dyn CorpusSource,
        kind: CorpusKind,
        normalizer: Normalizer,
    ) -> AppResult<Self> {
        let table = source.read_table()?;
        let corpus = Self::from_table(&table, kind, normalizer)?;

        tracing::info!(
            corpus = %kind,
            source = %source.describe(),
            rows = corpus.len(),
            normalizer = %normalizer.kind(),
            "Corpus loaded"
        );

        Ok(corpus)
    }

    pub fn from_table(table: &Table, kind: CorpusKind, normalizer: Normalizer) -> AppResult<Self> {
        let columns = required_columns(kind);
        let mut positions = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for name in columns {
            match table.column(name) {
                Some(idx) => positions.push(idx),
                None => missing.push(*name),
            }
        }

        if !missing.is_empty() {
            return Err(AppError::Schema(format!(
                "{} table is missing required columns: {}",
                kind,
                missing.join(", ")
            )));
        }

        if table.rows.is_empty() {
            return Err(AppError::Schema(format!("{} table has no rows", kind)));
        }

        let items = table
            .rows
            .iter()
            .enumerate()
            .map(|(id, row)| {
                let cells: Vec<&str> = positions
                    .iter()
                    .map(|&p| row.get(p).map(String::as_str).unwrap_or(""))
                    .collect();
                match kind {
                    CorpusKind::Projects => project_item(id, &cells, &normalizer),
                    CorpusKind::Courses => course_item(id, &cells, &normalizer),
                }
            })
            .collect();

        Ok(Self {
            kind,
            normalizer,
            items,
        })
    }

    pub fn kind(&self) -> CorpusKind {
        self.kind
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    pub fn items(&self) -> &[CorpusItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CorpusItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// cells follow PROJECT_COLUMNS order
fn project_item(id: usize, cells: &[&str], normalizer: &Normalizer) -> CorpusItem {
    let raw_tags = cells[1..].join(" ");

    CorpusItem {
        id,
        name: cells[0].to_string(),
        description: cells[1].to_string(),
        skills_required: cells[2].to_string(),
        url: None,
        tags: normalizer.normalize(&raw_tags),
    }
}

// cells follow COURSE_COLUMNS order
fn course_item(id: usize, cells: &[&str], normalizer: &Normalizer) -> CorpusItem {
    let name = clean_text(cells[0]);
    let description = clean_text(cells[2]);
    let skills: String = cells[3].chars().filter(|c| !matches!(c, '(' | ')')).collect();

    let raw_tags = [name.as_str(), cells[1], description.as_str(), skills.as_str()]
        .join(" ")
        .to_lowercase()
        .replace(',', " ");

    CorpusItem {
        id,
        name,
        description,
        skills_required: skills,
        url: Some(cells[4].trim().to_string()),
        tags: normalizer.normalize(&raw_tags),
    }
}

/// Collapses whitespace and comma runs and drops `_ : ( )`
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        let c = if c.is_whitespace() { ' ' } else { c };
        if (c == ' ' || c == ',') && prev == Some(c) {
            continue;
        }
        prev = Some(c);
        if !matches!(c, '_' | ':' | '(' | ')') {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::NormalizerKind;
    use std::io::Write;

    fn project_table() -> Table {
        Table::new(PROJECT_COLUMNS.iter().copied())
            .with_row([
                "Chat App",
                "Realtime chat",
                "Python",
                "Flask",
                "",
                "Web",
                "Communication",
            ])
            .with_row(["Ledger", "Accounting tools", "Java", "Spring", "Maven", "", ""])
    }

    #[test]
    fn test_project_tags_concatenate_descriptive_columns() {
        let corpus = Corpus::from_table(
            &project_table(),
            CorpusKind::Projects,
            Normalizer::new(NormalizerKind::Lemmatize),
        )
        .unwrap();

        assert_eq!(corpus.len(), 2);
        let first = &corpus.items()[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.name, "Chat App");
        assert_eq!(first.skills_required, "Python");
        assert_eq!(first.tags, "realtime chat python flask web communication");
        assert_eq!(corpus.items()[1].tags, "accounting tool java spring maven");
    }

    #[test]
    fn test_headers_match_case_insensitively() {
        let table = Table::new(PROJECT_COLUMNS.iter().map(|c| format!(" {} ", c.to_uppercase())))
            .with_row(["A", "b", "c", "d", "e", "f", "g"]);
        let corpus =
            Corpus::from_table(&table, CorpusKind::Projects, Normalizer::default()).unwrap();
        assert_eq!(corpus.items()[0].name, "A");
    }

    #[test]
    fn test_missing_columns_is_schema_error() {
        let table = Table::new([PROJECT_NAME, PROJECT_DESCRIPTION]).with_row(["a", "b"]);
        let err = Corpus::from_table(&table, CorpusKind::Projects, Normalizer::default())
            .unwrap_err();
        match err {
            AppError::Schema(msg) => assert!(msg.contains(PROJECT_DOMAIN)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_table_is_schema_error() {
        let table = Table::new(COURSE_COLUMNS.iter().copied());
        assert!(matches!(
            Corpus::from_table(&table, CorpusKind::Courses, Normalizer::default()),
            Err(AppError::Schema(_))
        ));
    }

    #[test]
    fn test_course_rows_are_cleaned() {
        let table = Table::new(COURSE_COLUMNS.iter().copied()).with_row([
            "Intro_to  ML: (Part 1)",
            "Beginner",
            "Learn,, models",
            "regression (linear)",
            " https://example.com/ml ",
        ]);
        let corpus = Corpus::from_table(
            &table,
            CorpusKind::Courses,
            Normalizer::new(NormalizerKind::Lemmatize),
        )
        .unwrap();

        let item = &corpus.items()[0];
        assert_eq!(item.name, "Introto ML Part 1");
        assert_eq!(item.description, "Learn, models");
        assert_eq!(item.skills_required, "regression linear");
        assert_eq!(item.url.as_deref(), Some("https://example.com/ml"));
        assert_eq!(
            item.tags,
            "introto ml part 1 beginner learn model regression linear"
        );
    }

    #[test]
    fn test_csv_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", COURSE_COLUMNS.join(",")).unwrap();
        writeln!(file, "Rust 101,Beginner,Systems programming,\"rust,cargo\",https://r.example").unwrap();
        writeln!(file, "Short row,Advanced").unwrap();

        let source = CsvSource::new(file.path());
        let table = source.read_table().unwrap();
        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][3], "rust,cargo");
        assert_eq!(table.rows[1], vec!["Short row", "Advanced", "", "", ""]);

        let corpus = Corpus::load(&source, CorpusKind::Courses, Normalizer::default()).unwrap();
        assert_eq!(corpus.items()[1].url.as_deref(), Some(""));
    }

    #[test]
    fn test_csv_source_missing_file() {
        let source = CsvSource::new("/nonexistent/projects.csv");
        assert!(matches!(
            source.read_table(),
            Err(AppError::DataNotFound(_))
        ));
    }

    #[test]
    fn test_load_propagates_source_errors() {
        let mut source = MockCorpusSource::new();
        source
            .expect_read_table()
            .times(1)
            .returning(|| Err(AppError::DataNotFound("projects.xlsx".to_string())));
        source.expect_describe().never();

        let result = Corpus::load(&source, CorpusKind::Projects, Normalizer::default());
        assert!(matches!(result, Err(AppError::DataNotFound(_))));
    }

    #[test]
    fn test_load_from_mocked_table() {
        let mut source = MockCorpusSource::new();
        source
            .expect_read_table()
            .returning(|| Ok(project_table()));
        source
            .expect_describe()
            .returning(|| "mock".to_string());

        let corpus = Corpus::load(&source, CorpusKind::Projects, Normalizer::default()).unwrap();
        assert_eq!(corpus.kind(), CorpusKind::Projects);
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_memory_source_serves_its_table() {
        let source = MemorySource::new(project_table());
        let corpus = Corpus::load(&source, CorpusKind::Projects, Normalizer::default()).unwrap();
        assert_eq!(corpus.items()[1].name, "Ledger");
        assert_eq!(source.describe(), "in-memory table");
    }
}
