/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use tasktrack_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = tasktrack_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::security::SecurityHeadersLayer,
    routes,
};
use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put, MethodRouter},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tasktrack_shared::{
    auth::{
        jwt::{JwtTokenService, TokenService},
        middleware::{extract_bearer_token, AuthContext, AuthError},
        password::{Argon2Hasher, PasswordHasher},
    },
    repository::Repositories,
    services::{ServiceError, Services},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, Level};

use routes::task_fields::{self, TaskField};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, absent when running on in-memory storage
    pub db: Option<PgPool>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Business services
    pub services: Services,

    /// Bearer token issuer and verifier
    pub tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Creates state backed by PostgreSQL
    pub fn new(db: PgPool, config: Config) -> Self {
        let repos = Repositories::postgres(db.clone());
        Self::from_parts(config, repos, Arc::new(Argon2Hasher::default()), Some(db))
    }

    /// Creates state from explicit repositories and hasher
    pub fn from_parts(
        config: Config,
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        db: Option<PgPool>,
    ) -> Self {
        let tokens = JwtTokenService::new(
            config.jwt.secret.clone(),
            chrono::Duration::hours(config.jwt.expiration_hours),
        );

        Self {
            db,
            config: Arc::new(config),
            services: Services::new(repos, hasher),
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                         # public
/// ├── POST /register                       # public
/// ├── POST /auth                           # public, returns a bearer token
/// ├── GET  /profile
/// ├── /api/users/
/// │   ├── GET  /                           # list
/// │   ├── GET  /:user                      # `me` or a numeric id
/// │   ├── GET  /:user/:field               # name, email, id, created-tasks, assigned-tasks
/// │   └── PUT  /:user/:field               # name, email, password of the acting user
/// └── /api/tasks/
///     ├── GET, POST /
///     ├── GET, DELETE /:task_id
///     ├── GET  /:task_id/{id,author}
///     ├── GET, PUT /:task_id/{title,description,status,priority}
///     ├── GET, POST, DELETE /:task_id/{assignees,comments}
///     └── PUT  /:task_id/comments/:comment_id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Bearer authentication (every route except the public ones)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::auth::register))
        .route("/auth", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/profile", get(routes::auth::profile))
        .route("/api/users", get(routes::users::list_users))
        .route("/api/users/", get(routes::users::list_users))
        .route("/api/users/:user", get(routes::users::get_user))
        .route(
            "/api/users/:user/:field",
            get(routes::users::read_field).put(routes::users::update_field),
        )
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/:task_id",
            get(routes::tasks::get_task).delete(routes::tasks::delete_task),
        )
        .route("/api/tasks/:task_id/id", field_reader(TaskField::Id))
        .route("/api/tasks/:task_id/author", field_reader(TaskField::Author))
        .route(
            "/api/tasks/:task_id/title",
            field_reader(TaskField::Title).put(task_fields::update_title),
        )
        .route(
            "/api/tasks/:task_id/description",
            field_reader(TaskField::Description).put(task_fields::update_description),
        )
        .route(
            "/api/tasks/:task_id/status",
            field_reader(TaskField::Status).put(task_fields::update_status),
        )
        .route(
            "/api/tasks/:task_id/priority",
            field_reader(TaskField::Priority).put(task_fields::update_priority),
        )
        .route(
            "/api/tasks/:task_id/assignees",
            field_reader(TaskField::Assignees)
                .post(task_fields::append_assignee)
                .delete(task_fields::remove_assignee),
        )
        .route(
            "/api/tasks/:task_id/comments",
            field_reader(TaskField::Comments)
                .post(task_fields::create_comment)
                .delete(task_fields::delete_comment),
        )
        .route(
            "/api/tasks/:task_id/comments/:comment_id",
            put(task_fields::update_comment_text),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// GET route reading one fixed task field
fn field_reader(field: TaskField) -> MethodRouter<AppState> {
    get(move |state: State<AppState>, path: Path<i64>| {
        task_fields::read_field(state, path, field)
    })
}

/// Bearer authentication middleware
///
/// Verifies the token, loads the user named by its subject and injects an
/// [`AuthContext`] into the request extensions. Every failure is a 401.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = {
        let token = extract_bearer_token(req.headers())?;
        state.tokens.verify(token)?
    };

    let user = state
        .services
        .identity
        .resolve_acting_user(&subject)
        .await
        .map_err(|err| match err {
            ServiceError::NotFound(_) => ApiError::from(AuthError::UnknownPrincipal),
            other => other.into(),
        })?;

    debug!(user_id = user.id, "Authenticated request");
    req.extensions_mut().insert(AuthContext::new(user));

    Ok(next.run(req).await)
}
