use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    add_users, create_organization, delete_organization, get_available_parents,
    get_organization_by_id, get_organizations, update_organization,
};

pub fn init_organizations_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_organization).get(get_organizations))
        .route("/available-parents", get(get_available_parents))
        .route(
            "/{id}",
            get(get_organization_by_id)
                .put(update_organization)
                .delete(delete_organization),
        )
        .route("/{id}/add-users", post(add_users))
}
