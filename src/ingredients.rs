use axum::Router;

use crate::{
    catalog::{handlers, CatalogKind},
    state::AppState,
};

pub struct Ingredients;

impl CatalogKind for Ingredients {
    const TABLE: &'static str = "ingredients";
    const LABEL: &'static str = "Ingredient";
    const PATH: &'static str = "ingredients";
}

pub fn router() -> Router<AppState> {
    handlers::routes::<Ingredients>()
}
