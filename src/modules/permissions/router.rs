use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_permission, delete_permission, get_permission_by_id, get_permissions,
    update_permission,
};

pub fn init_permissions_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_permission).get(get_permissions))
        .route(
            "/{id}",
            get(get_permission_by_id)
                .put(update_permission)
                .delete(delete_permission),
        )
}
