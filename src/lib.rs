pub mod admin;
pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod images;
pub mod ingredients;
pub mod pagination;
pub mod permissions;
pub mod recipes;
pub mod state;
pub mod storage;
pub mod tags;
