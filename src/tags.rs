use axum::Router;

use crate::{
    catalog::{handlers, CatalogKind},
    state::AppState,
};

/// Labels attached to recipes.
pub struct Tags;

impl CatalogKind for Tags {
    const TABLE: &'static str = "tags";
    const LABEL: &'static str = "Tag";
    const PATH: &'static str = "tags";
}

pub fn router() -> Router<AppState> {
    handlers::routes::<Tags>()
}
