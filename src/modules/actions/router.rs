use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_action, delete_action, get_action_by_id, get_actions, update_action,
};

pub fn init_actions_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_action).get(get_actions))
        .route(
            "/{id}",
            get(get_action_by_id).put(update_action).delete(delete_action),
        )
}
