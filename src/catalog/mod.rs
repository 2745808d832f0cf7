//! Tags and ingredients: named records owned by a user, with identical
//! CRUD semantics over separate tables.

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

/// Table and route naming for one catalog resource.
pub trait CatalogKind: Send + Sync + 'static {
    const TABLE: &'static str;
    const LABEL: &'static str;
    const PATH: &'static str;
}
