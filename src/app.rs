use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/progress/reset", post(handlers::reset_progress))
        .route("/projects/complete", post(handlers::complete_project))
        .route("/projects/:index/open", post(handlers::open_project))
        .route("/projects/:index/research", post(handlers::open_research))
        .route("/research/close", post(handlers::close_research))
        .route("/tasks/toggle", post(handlers::toggle_task))
        .route("/show/:page", post(handlers::show_page))
        .route("/chat/toggle", post(handlers::toggle_chat))
        .route("/chat/close", post(handlers::close_chat))
        .route("/chat/send", post(handlers::send_chat))
        .with_state(state)
}
