mod health;
mod products;
mod token;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{middleware::auth_gate, AppState};

pub fn create_router(state: AppState) -> Router<AppState> {
    let produtos = Router::new()
        .route(
            "/produtos/",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/produtos/{id}/",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_gate));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/token/", post(token::obtain_token_pair))
        .route("/token/refresh/", post(token::refresh_token))
        .merge(produtos)
}
