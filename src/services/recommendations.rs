use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    error::{AppError, AppResult},
    models::{CorpusKind, CourseRecommendations, ProjectRecommendations},
    services::index::{Index, ScoredItem},
};

/// Extra candidates beyond `top_n` that take part in the shuffle
pub const CANDIDATE_PADDING: usize = 6;

/// Flattens attribute groups into lower-cased, trimmed tokens
///
/// Missing groups and groups holding only an empty string are skipped.
pub fn flatten_attributes(groups: &[Option<Vec<String>>]) -> Vec<String> {
    groups
        .iter()
        .flatten()
        .filter(|group| !group.is_empty() && !(group.len() == 1 && group[0].trim().is_empty()))
        .flat_map(|group| group.iter().map(|token| token.trim().to_lowercase()))
        .collect()
}

/// Ranks `[1, top_n + CANDIDATE_PADDING)` of `ranked`, shuffled and cut to `top_n`
///
/// The single best match is always left out.
pub fn select_candidates<R: Rng + ?Sized>(
    ranked: &[ScoredItem],
    top_n: usize,
    rng: &mut R,
) -> Vec<ScoredItem> {
    let end = top_n.saturating_add(CANDIDATE_PADDING).min(ranked.len());
    if end <= 1 {
        return Vec::new();
    }
    let mut window = ranked[1..end].to_vec();
    window.shuffle(rng);
    window.truncate(top_n);
    window
}

/// RNG for one request: seeded when the service runs reproducibly
pub fn request_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Scores user attributes against one index
pub struct Recommender<'a> {
    index: &'a Index,
}

impl<'a> Recommender<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// Candidates for the given attribute groups, in shuffled order
    ///
    /// Fails with `EmptyInput` when no group carries a token. A query with no
    /// in-vocabulary terms yields no candidates.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        groups: &[Option<Vec<String>>],
        top_n: usize,
        rng: &mut R,
    ) -> AppResult<Vec<ScoredItem>> {
        let tokens = flatten_attributes(groups);
        let normalized = self.index.normalizer().normalize_tokens(&tokens);
        if normalized.is_empty() {
            return Err(AppError::EmptyInput);
        }

        let query = self.index.vectorize(&normalized);
        if query.is_zero() {
            tracing::debug!(
                corpus = %self.index.kind(),
                query = %normalized,
                "Query has no in-vocabulary terms"
            );
            return Ok(Vec::new());
        }

        let ranked = self.index.rank(&query);
        let selected = select_candidates(&ranked, top_n, rng);

        tracing::debug!(
            corpus = %self.index.kind(),
            tokens = tokens.len(),
            query_terms = query.entries().len(),
            selected = selected.len(),
            "Candidates selected"
        );

        Ok(selected)
    }
}

fn ensure_kind(index: &Index, expected: CorpusKind) -> AppResult<()> {
    if index.kind() == expected {
        Ok(())
    } else {
        Err(AppError::Internal(format!(
            "expected a {} index, got {}",
            expected,
            index.kind()
        )))
    }
}

/// Selected candidates, or nothing when the caller supplied no usable tokens
fn recommend_or_empty<R: Rng + ?Sized>(
    index: &Index,
    groups: &[Option<Vec<String>>],
    top_n: usize,
    rng: &mut R,
) -> AppResult<Vec<ScoredItem>> {
    match Recommender::new(index).recommend(groups, top_n, rng) {
        Err(AppError::EmptyInput) => Ok(Vec::new()),
        other => other,
    }
}

/// Projects for `skills, framework, tools, category, domain` groups
pub fn recommend_projects<R: Rng + ?Sized>(
    index: &Index,
    groups: &[Option<Vec<String>>],
    top_n: usize,
    rng: &mut R,
) -> AppResult<ProjectRecommendations> {
    ensure_kind(index, CorpusKind::Projects)?;
    let selected = recommend_or_empty(index, groups, top_n, rng)?;
    selected
        .iter()
        .map(|candidate| index.lookup(candidate.index))
        .collect()
}

/// Courses for `skills, domain` groups
pub fn recommend_courses<R: Rng + ?Sized>(
    index: &Index,
    groups: &[Option<Vec<String>>],
    top_n: usize,
    rng: &mut R,
) -> AppResult<CourseRecommendations> {
    ensure_kind(index, CorpusKind::Courses)?;
    let selected = recommend_or_empty(index, groups, top_n, rng)?;
    selected
        .iter()
        .map(|candidate| index.lookup(candidate.index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{graded_project_index, three_project_index};
    use proptest::prelude::*;

    fn groups(values: &[&[&str]]) -> Vec<Option<Vec<String>>> {
        values
            .iter()
            .map(|g| Some(g.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_flatten_skips_empty_groups() {
        let input = vec![
            Some(vec!["  Python ".to_string(), "SQL".to_string()]),
            None,
            Some(vec![String::new()]),
            Some(vec![]),
            Some(vec!["Web".to_string()]),
        ];
        assert_eq!(flatten_attributes(&input), vec!["python", "sql", "web"]);
    }

    #[test]
    fn test_select_excludes_top_and_caps_window() {
        let ranked: Vec<ScoredItem> = (0..20)
            .map(|i| ScoredItem {
                index: i,
                score: 1.0 - i as f64 / 20.0,
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = select_candidates(&ranked, 3, &mut rng);

        assert_eq!(picked.len(), 3);
        for item in &picked {
            assert!((1..9).contains(&item.index));
        }
    }

    #[test]
    fn test_select_with_short_ranking() {
        let ranked = vec![ScoredItem { index: 0, score: 1.0 }];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_candidates(&ranked, 5, &mut rng).is_empty());
        assert!(select_candidates(&[], 5, &mut rng).is_empty());
    }

    #[test]
    fn test_three_project_scenario() {
        let index = three_project_index();
        let mut rng = StdRng::seed_from_u64(42);
        let result =
            recommend_projects(&index, &groups(&[&["python", "web"]]), 20, &mut rng).unwrap();

        // A wins the tie and is left out; B and C remain
        assert_eq!(result.len(), 2);
        let mut indices = result.indices.clone();
        indices.sort_unstable();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(result.names.len(), result.descriptions.len());
        assert_eq!(result.skills.len(), result.indices.len());
    }

    #[test]
    fn test_empty_attributes_yield_no_recommendations() {
        let index = three_project_index();
        let mut rng = StdRng::seed_from_u64(0);
        let input = vec![Some(vec![String::new()]), None, None, None, None];

        assert!(matches!(
            Recommender::new(&index).recommend(&input, 5, &mut rng),
            Err(AppError::EmptyInput)
        ));
        let result = recommend_projects(&index, &input, 5, &mut rng).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_out_of_vocabulary_query_yields_nothing() {
        let index = three_project_index();
        let mut rng = StdRng::seed_from_u64(0);
        let result = recommend_projects(&index, &groups(&[&["cobol"]]), 5, &mut rng).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let index = graded_project_index(30);
        let input = groups(&[&["python"]]);
        let first = recommend_projects(&index, &input, 5, &mut request_rng(Some(9))).unwrap();
        let second = recommend_projects(&index, &input, 5, &mut request_rng(Some(9))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let index = three_project_index();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(recommend_courses(&index, &groups(&[&["python"]]), 5, &mut rng).is_err());
    }

    #[test]
    fn test_huge_top_n_returns_every_candidate_but_the_best() {
        let index = graded_project_index(30);
        let mut rng = StdRng::seed_from_u64(5);
        let result =
            recommend_projects(&index, &groups(&[&["python"]]), usize::MAX, &mut rng).unwrap();
        assert_eq!(result.len(), index.len() - 1);
        assert!(!result.indices.contains(&0));
    }

    #[test]
    fn test_returned_indices_round_trip_through_lookup() {
        let index = graded_project_index(25);
        let mut rng = StdRng::seed_from_u64(3);
        let result =
            recommend_projects(&index, &groups(&[&["python"]]), 10, &mut rng).unwrap();
        for (pos, idx) in result.indices.iter().enumerate() {
            let item = index.lookup(*idx).unwrap();
            assert_eq!(item.name, result.names[pos]);
            assert_eq!(item.description, result.descriptions[pos]);
        }
    }

    proptest! {
        #[test]
        fn prop_result_bounded_and_from_window(top_n in 0usize..30, seed in any::<u64>()) {
            let index = graded_project_index(40);
            let input = groups(&[&["python"]]);
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = Recommender::new(&index).recommend(&input, top_n, &mut rng).unwrap();

            prop_assert!(picked.len() <= top_n);

            let ranked = index.rank(&index.query_vector("python"));
            let window_end = top_n.saturating_add(CANDIDATE_PADDING).min(ranked.len());
            let floor = ranked[window_end..]
                .iter()
                .map(|s| s.score)
                .fold(f64::NEG_INFINITY, f64::max);
            for item in &picked {
                prop_assert!(item.index != ranked[0].index);
                prop_assert!(item.score >= floor);
            }
        }
    }
}
