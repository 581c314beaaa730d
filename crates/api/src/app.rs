use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{
    ApplicationLifecycle, ConversationDispatcher, InMemorySessionStore, LifecycleConfig,
    NotificationGateway, Notifier, RegistrationSessions,
};
use persistence::repositories::{ApplicationRepository, SettingRepository, ViewRepository};
use shared::jwt::{JwtConfig, JwtError};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, trace_id, AdminAuthenticator,
    JwtAdminAuthenticator,
};
use crate::routes::{applications, companies, health, settings, telegram, views};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub lifecycle: ApplicationLifecycle,
    pub dispatcher: ConversationDispatcher,
    pub authenticator: Arc<dyn AdminAuthenticator>,
    pub settings: SettingRepository,
}

impl AppState {
    /// Wires repositories, the lifecycle, the dispatcher and admin auth.
    ///
    /// `gateway` carries every outbound chat message, replies included.
    pub fn new(
        config: Config,
        pool: PgPool,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Result<Self, JwtError> {
        let config = Arc::new(config);

        let jwt = JwtConfig::with_leeway(
            &config.auth.token_secret,
            &config.auth.issuer,
            config.auth.token_expiry_secs,
            config.auth.leeway_secs,
        )?;

        let lifecycle = ApplicationLifecycle::new(
            Arc::new(ApplicationRepository::new(pool.clone())),
            Arc::new(ViewRepository::new(pool.clone())),
            gateway.clone(),
            LifecycleConfig {
                admin_recipients: config.notifications.admin_recipients.clone(),
                notify_timeout: config.notifications.send_timeout(),
            },
        );

        let sessions = RegistrationSessions::new(
            Arc::new(InMemorySessionStore::new()),
            config.registration.session_ttl(),
        );
        let dispatcher = ConversationDispatcher::new(
            lifecycle.clone(),
            sessions,
            Notifier::new(gateway, config.notifications.send_timeout()),
            config.telegram.catalog_url.clone(),
            config.notifications.admin_recipients.clone(),
        );

        Ok(Self {
            settings: SettingRepository::new(pool.clone()),
            pool,
            config,
            lifecycle,
            dispatcher,
            authenticator: Arc::new(JwtAdminAuthenticator::new(jwt)),
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
    let headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        HeaderName::from_static("x-request-id"),
    ];

    if config.security.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(headers)
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Admin routes (require an admin bearer token)
    let admin_routes = Router::new()
        .route(
            "/api/admin/applications",
            get(applications::list_applications),
        )
        .route(
            "/api/admin/applications/review",
            post(applications::review_application),
        )
        .route(
            "/api/admin/applications/:id",
            put(applications::update_application).delete(applications::delete_application),
        )
        .route("/api/admin/settings/theme", put(settings::update_theme))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .route("/api/applications", post(applications::submit_application))
        .route("/api/companies", get(companies::list_companies))
        .route("/api/companies/:id", get(companies::get_company))
        .route("/api/views", post(views::track_view))
        .route("/api/settings/theme", get(settings::get_theme));

    // Authenticated by the secret token header inside the handler
    let webhook_routes =
        Router::new().route("/api/telegram/webhook", post(telegram::telegram_webhook));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(webhook_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
