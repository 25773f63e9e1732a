use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{
        CorpusItem, CourseQuery, CourseRecommendations, ProjectQuery, ProjectRecommendations,
        SimilarItem,
    },
    services::{
        recommendations::{recommend_courses, recommend_projects, request_rng},
        IndexState,
    },
};

use super::AppState;

const DEFAULT_SIMILAR_COUNT: usize = 10;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub projects: IndexState,
    pub courses: IndexState,
}

#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    pub top_n: Option<usize>,
}

/// Health check with the state of both indices
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let projects = state.projects.state();
    let courses = state.courses.state();
    let status = if projects == IndexState::Ready && courses == IndexState::Ready {
        "ready"
    } else {
        "starting"
    };

    Json(HealthResponse {
        status,
        projects,
        courses,
    })
}

/// Recommend projects for the supplied skills, framework, tools, category and domain
///
/// Answers 200 with empty arrays when no attribute is given or none of the
/// attribute terms occur in the project vocabulary.
pub async fn project_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(query): Json<ProjectQuery>,
) -> AppResult<Json<ProjectRecommendations>> {
    let index = state.projects.get()?;
    let top_n = query.top_n.unwrap_or(state.settings.default_top_n);
    let groups = query.into_groups();

    let mut rng = request_rng(state.settings.rng_seed);
    let recommendations = recommend_projects(&index, &groups, top_n, &mut rng)?;

    tracing::info!(
        request_id = %request_id,
        top_n,
        returned = recommendations.len(),
        "Project recommendations served"
    );

    Ok(Json(recommendations))
}

/// Recommend courses for the supplied skills and domain
///
/// Same empty-result rules as [`project_recommendations`].
pub async fn course_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(query): Json<CourseQuery>,
) -> AppResult<Json<CourseRecommendations>> {
    let index = state.courses.get()?;
    let top_n = query.top_n.unwrap_or(state.settings.default_top_n);
    let groups = query.into_groups();

    let mut rng = request_rng(state.settings.rng_seed);
    let recommendations = recommend_courses(&index, &groups, top_n, &mut rng)?;

    tracing::info!(
        request_id = %request_id,
        top_n,
        returned = recommendations.len(),
        "Course recommendations served"
    );

    Ok(Json(recommendations))
}

/// Project details by corpus index
pub async fn get_project(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<Json<CorpusItem>> {
    let projects = state.projects.get()?;
    let item = projects.lookup(index)?;
    Ok(Json(item.clone()))
}

/// Course details by corpus index
pub async fn get_course(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<Json<CorpusItem>> {
    let courses = state.courses.get()?;
    let item = courses.lookup(index)?;
    Ok(Json(item.clone()))
}

/// Projects most similar to the project at `index`
pub async fn similar_projects(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Query(params): Query<SimilarParams>,
) -> AppResult<Json<Vec<SimilarItem>>> {
    let top_n = params.top_n.unwrap_or(DEFAULT_SIMILAR_COUNT);
    if top_n == 0 {
        return Err(AppError::InvalidInput(
            "top_n must be greater than zero".to_string(),
        ));
    }

    let projects = state.projects.get()?;
    Ok(Json(projects.similar_items(index, top_n)?))
}
