//! HTTP surface for the popsicle inventory.
//!
//! # Responsibility
//! - Map inventory operations onto JSON endpoints under a base path.
//! - Translate service errors into status codes and response bodies.
//! - Own process startup and shutdown for the `popsicled` binary.
//!
//! # Invariants
//! - Handlers never touch storage directly; every call goes through
//!   `InventoryService`.
//! - A panicking handler yields a 500 problem document, not a dropped
//!   connection.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

use axum::{middleware::from_fn, routing::get, Router};
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
};

pub use config::{ServerConfig, StoreConfig};
pub use error::{ApiError, ProblemDetails};
pub use server::{build_repository, serve, StartupError};
pub use state::ApiState;

/// Router wrapped so `/PopsicleInventory/1/` routes like `/PopsicleInventory/1`.
pub type App = NormalizePath<Router>;

/// Assembles the full application service for `state`.
pub fn router(state: ApiState) -> App {
    let inventory = if state.base_path().is_empty() {
        routes::routes()
    } else {
        Router::new().nest(state.base_path(), routes::routes())
    };

    let app = inventory
        .route("/error", get(routes::error_route))
        .layer(CatchPanicLayer::custom(middleware::problem_for_panic))
        .layer(from_fn(middleware::time_requests))
        .layer(from_fn(middleware::log_requests))
        .with_state(state);

    // Path rewriting has to run before the router matches.
    NormalizePathLayer::trim_trailing_slash().layer(app)
}
