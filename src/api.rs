//! The API responder served next to the site.

use axum::{Json, Router, routing::get};
use serde::Serialize;

/// Where the API is mounted.
pub const BASE_PATH: &str = "/api";

/// The message returned by the root route.
pub const GREETING: &str = "Hello from Hono!";

#[derive(Debug, Serialize)]
struct Greeting {
    message: &'static str,
}

async fn greeting() -> Json<Greeting> {
    Json(Greeting { message: GREETING })
}

/// Routes under [`BASE_PATH`]. `/api` and `/api/` both answer GET with the
/// greeting; other methods get `405 Method Not Allowed`.
pub fn router() -> Router {
    Router::new()
        .route(BASE_PATH, get(greeting))
        .route(&format!("{BASE_PATH}/"), get(greeting))
}
