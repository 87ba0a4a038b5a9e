//! Public catalogue endpoints.

use crate::{
    api::{
        auth::OptionalUser,
        error::{ApiPath, ApiQuery},
        state::SharedState,
    },
    core::course::{self, CourseFilter, CourseLevel, CourseOutline, CourseSort},
    entities::course as course_entity,
    errors::{Error, Result},
};
use axum::{Json, extract::State};
use serde::Deserialize;

/// Catalogue query string.
#[derive(Debug, Default, Deserialize)]
pub struct CourseQuery {
    /// Exact category, any case.
    pub category: Option<String>,
    /// `beginner`, `intermediate` or `advanced`.
    pub level: Option<String>,
    /// Words matched against title and description.
    pub search: Option<String>,
    /// Highest price to include.
    pub max_price: Option<f64>,
    /// Only free courses.
    #[serde(default)]
    pub free: bool,
    /// Result order.
    #[serde(default)]
    pub sort: CourseSort,
}

impl CourseQuery {
    fn into_filter(self) -> Result<CourseFilter> {
        let level = match self.level.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(
                CourseLevel::parse(name)
                    .ok_or_else(|| Error::validation(format!("Unknown course level '{name}'")))?,
            ),
        };
        if let Some(amount) = self.max_price.filter(|p| !p.is_finite() || *p < 0.0) {
            return Err(Error::InvalidAmount { amount });
        }
        Ok(CourseFilter {
            category: self
                .category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
            level,
            keywords: self
                .search
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(ToString::to_string)
                .collect(),
            max_price: self.max_price,
            free_only: self.free,
            sort: self.sort,
        })
    }
}

/// `GET /api/courses`
pub async fn list(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<CourseQuery>,
) -> Result<Json<Vec<course_entity::Model>>> {
    let filter = query.into_filter()?;
    Ok(Json(course::list_published_courses(&state.db, &filter, None).await?))
}

/// `GET /api/courses/categories`
pub async fn categories(State(state): State<SharedState>) -> Result<Json<Vec<String>>> {
    Ok(Json(course::list_categories(&state.db).await?))
}

/// `GET /api/courses/:id` - course outline; videos only for viewers with access.
pub async fn outline(
    State(state): State<SharedState>,
    OptionalUser(viewer): OptionalUser,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<Json<CourseOutline>> {
    Ok(Json(
        course::get_course_outline(&state.db, course_id, viewer.as_ref()).await?,
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_query_into_filter() {
        let filter = CourseQuery {
            category: Some(" Design ".to_string()),
            level: Some("Advanced".to_string()),
            search: Some("rust  async".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.category.as_deref(), Some("design"));
        assert_eq!(filter.level, Some(CourseLevel::Advanced));
        assert_eq!(filter.keywords, vec!["rust".to_string(), "async".to_string()]);

        let bad_level = CourseQuery {
            level: Some("expert".to_string()),
            ..Default::default()
        }
        .into_filter();
        assert!(matches!(bad_level.unwrap_err(), Error::Validation { .. }));

        let bad_price = CourseQuery {
            max_price: Some(-5.0),
            ..Default::default()
        }
        .into_filter();
        assert!(matches!(bad_price.unwrap_err(), Error::InvalidAmount { .. }));
    }
}
