use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_user, delete_user, get_available_users, get_user_by_id, get_users, update_user,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(get_users))
        .route("/available", get(get_available_users))
        .route(
            "/{id}",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
}
