use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use pactum_api::audit;
use pactum_api::config::AppConfig;
use pactum_api::db::Store;
use pactum_api::error::ApiError;
use pactum_api::handlers;
use pactum_api::middleware::{auth_middleware, tenant_gate_middleware, ApiResponse, ApiResult};
use pactum_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up MONGO_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pactum_api=debug,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting Pactum API in {:?} mode", config.environment);

    let store = Store::connect(&config.database).await?;
    store.initialize_indexes().await?;

    let state = AppState::new(config, store);

    // Retention sweeper runs for the lifetime of the process
    tokio::spawn(audit::run_retention_sweeper(
        state.audit.clone(),
        state.config.audit.clone(),
    ));

    let app = app(state.clone());

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("🚀 Pactum API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    let cors = if state.config.security.enable_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(tenant_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/api/public/register-company", post(public::register_company))
        .route("/api/auth/login", post(public::login))
        .route("/api/modules", get(public::list_modules))
}

/// Routes behind authentication only: session introspection and the
/// SUPER_ADMIN surface, which operates across tenants and so skips the gate.
fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::{admin, session};

    Router::new()
        .route("/api/auth/me", get(session::me))
        .route("/api/admin/companies", get(admin::list_companies))
        .route(
            "/api/admin/companies/:id",
            get(admin::get_company).put(admin::update_company),
        )
        .route("/api/admin/companies/:id/modules", post(admin::assign_modules))
        .route(
            "/api/admin/companies/:id/subscription",
            post(admin::update_subscription),
        )
        .route("/api/admin/metrics", get(admin::platform_metrics))
        .layer(from_fn_with_state(state, auth_middleware))
}

/// Routes behind authentication plus the tenant gate. Layer order matters:
/// the outermost layer runs first, so auth is applied after (outside) the
/// gate here.
fn tenant_routes(state: AppState) -> Router<AppState> {
    use handlers::{activities, clients, dashboard, logs, payments, phases, projects, tasks, users};

    Router::new()
        .route("/api/clients", get(clients::list_clients).post(clients::create_client))
        .route(
            "/api/clients/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/api/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route(
            "/api/activities/:id",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route("/api/projects", get(projects::list_projects))
        .route(
            "/api/projects/:id",
            get(projects::get_project).put(projects::update_project),
        )
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/:id",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/tasks/:id/comments", post(tasks::add_task_comment))
        .route("/api/phases", get(phases::list_phases))
        .route(
            "/api/phases/:id",
            get(phases::get_phase).put(phases::update_phase),
        )
        .route("/api/phases/:id/approve", post(phases::approve_phase))
        .route("/api/phases/:id/comments", post(phases::add_phase_comment))
        .route("/api/payments", get(payments::list_payments))
        .route("/api/payments/:id", put(payments::update_payment))
        .route(
            "/api/company/users",
            get(users::list_company_users).post(users::create_company_user),
        )
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/activity-logs", get(logs::list_audit_logs))
        .layer(from_fn_with_state(state.clone(), tenant_gate_middleware))
        .layer(from_fn_with_state(state, auth_middleware))
}

async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "Pactum API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": ["/api/public/register-company", "/api/auth/login", "/api/modules"],
            "session": ["/api/auth/me"],
            "admin": ["/api/admin/companies", "/api/admin/metrics"],
            "tenant": [
                "/api/clients", "/api/activities", "/api/projects", "/api/tasks",
                "/api/phases", "/api/payments", "/api/company/users",
                "/api/dashboard/stats", "/api/activity-logs"
            ]
        }
    })))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Value> {
    state
        .store
        .health_check()
        .await
        .map_err(|_| ApiError::service_unavailable("Database unreachable"))?;
    Ok(ApiResponse::success(json!({ "status": "healthy" })))
}
