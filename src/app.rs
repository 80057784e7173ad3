use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    database,
    error::{AppError, Result},
    routes,
    services::accounts,
    store::{PgStore, ProductStore, UserStore},
    utils::jwt::TokenIssuer,
};

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// State backed by a single store serving both products and users.
    pub fn with_store<S>(store: Arc<S>, tokens: TokenIssuer) -> Self
    where
        S: ProductStore + UserStore + 'static,
    {
        Self {
            products: store.clone(),
            users: store,
            tokens: Arc::new(tokens),
        }
    }
}

/// Routes plus request tracing, without the deployment-specific layers.
pub fn router(state: AppState) -> Router {
    routes::create_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;
    let tokens = TokenIssuer::new(&config.auth)?;
    let state = AppState::with_store(Arc::new(PgStore::new(pool)), tokens);

    if let Some(bootstrap) = &config.bootstrap_user {
        accounts::ensure_user(
            state.users.as_ref(),
            &bootstrap.username,
            &bootstrap.password,
            bcrypt::DEFAULT_COST,
        )
        .await?;
    }

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|_| {
                AppError::ConfigError(format!("Invalid CORS origin: {}", origin))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let app = router(state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors);

    Ok(app)
}
