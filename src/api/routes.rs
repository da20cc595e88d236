use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::require_auth;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Open routes -- no token needed
    let open_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register));

    // Gated routes -- the caller's identity is attached before the handler runs
    let gated_routes = Router::new()
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        .route("/user", get(handlers::get_user))
        .route("/user/:user_id", get(handlers::get_user_by_id))
        .route(
            "/item",
            post(handlers::create_item).get(handlers::list_items),
        )
        .route(
            "/item/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route(
            "/item/:item_id/image",
            post(handlers::upload_item_image)
                .delete(handlers::clear_item_image)
                .layer(DefaultBodyLimit::max(state.config.uploads.max_bytes)),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]);

    Router::new()
        .nest("/api", open_routes.merge(gated_routes))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::testutil::{setup_db, setup_uploads, test_state};

    fn app() -> (Router, Vec<tempfile::TempDir>) {
        let (db, db_dir) = setup_db();
        let (uploads, upload_dir) = setup_uploads();
        (create_router(test_state(db, uploads)), vec![db_dir, upload_dir])
    }

    #[tokio::test]
    async fn test_gated_routes_require_token() {
        let (app, _dirs) = app();

        for (method, uri) in [
            ("GET", "/api/me"),
            ("GET", "/api/item"),
            ("POST", "/api/item"),
            ("DELETE", "/api/item/1"),
            ("DELETE", "/api/item/1/image"),
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let (app, _dirs) = app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
