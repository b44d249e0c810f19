use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer. The builder UI runs on a different origin in
/// development, so origins stay permissive; methods are the ones the
/// page routes actually serve.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_headers(Any)
}
