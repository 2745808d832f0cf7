use recipebox::{app, auth::services::bootstrap_superuser, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipebox=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    if let Some(admin) = &app_state.config.bootstrap_admin {
        bootstrap_superuser(&app_state.db, admin)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap superuser: {e}"))?;
    }

    app::serve(app::build_app(app_state)).await
}
