use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::pages;
use crate::state::AppState;

/// Submission form.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(pages::form_page(&state.config, &pages::blank_form(), &[]))
}
