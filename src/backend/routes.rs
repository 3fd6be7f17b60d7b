use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/test", post(handlers::auth_test))
        .route("/goals", post(handlers::create_goal))
        .route(
            "/goals/:id",
            get(handlers::goals_by_user).delete(handlers::delete_goal),
        )
}
