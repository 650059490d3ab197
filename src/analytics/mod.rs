//! Read-only aggregates over every user's wardrobe, for admins.

pub mod dto;
pub mod handlers;
pub mod histogram;
pub mod location;
pub mod price;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
