mod api;
mod cli;
mod handlers;
mod services;
mod settings;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post, put};
use axum::Router;
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostdesk_db::repositories::catalog_repo::CatalogRepository;
use hostdesk_db::repositories::country_repo::CountryRepository;
use hostdesk_db::repositories::invoice_repo::InvoiceRepository;
use hostdesk_db::repositories::order_repo::OrderRepository;
use hostdesk_db::repositories::referral_repo::ReferralRepository;
use hostdesk_db::repositories::server_repo::ServerRepository;
use hostdesk_db::repositories::ticket_repo::TicketRepository;
use hostdesk_db::repositories::user_repo::UserRepository;

use services::commission_service::CommissionService;
use services::order_service::OrderService;
use services::referral_service::ReferralService;
use services::user_service::UserService;
use settings::SettingsService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<SettingsService>,

    pub user_service: Arc<UserService>,
    pub order_service: Arc<OrderService>,
    pub referral_service: Arc<ReferralService>,

    pub users: Arc<UserRepository>,
    pub countries: Arc<CountryRepository>,
    pub catalog: Arc<CatalogRepository>,
    pub orders: Arc<OrderRepository>,
    pub invoices: Arc<InvoiceRepository>,
    pub servers: Arc<ServerRepository>,
    pub referrals: Arc<ReferralRepository>,
    pub tickets: Arc<TicketRepository>,

    pub session_secret: String,
}

#[derive(Parser)]
#[command(name = "hostdesk")]
#[command(about = "Hostdesk hosting back-office API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Administrative tools
    Admin {
        #[command(subcommand)]
        subcommand: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Reset a user's password and grant the admin role
    ResetPassword {
        /// Account email
        email: String,
        /// New password
        new_pass: String,
    },
    /// Show deployment information
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: failed to load .env file: {}", e);
    }

    let cli = Cli::parse();

    let file_appender = tracing_appender::rolling::never(".", "server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostdesk=debug,axum=info,tower_http=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    let pool = hostdesk_db::db::init_db().await?;

    match cli.command {
        Commands::Serve => run_server(pool).await?,
        Commands::Admin { subcommand } => match subcommand {
            AdminCommands::ResetPassword { email, new_pass } => {
                cli::reset_password(&pool, &email, &new_pass).await?;
            }
            AdminCommands::Info => cli::info(&pool).await?,
        },
    }

    Ok(())
}

async fn build_state(pool: PgPool) -> Result<AppState> {
    let settings = Arc::new(SettingsService::new(pool.clone()).await?);

    let users = UserRepository::new(pool.clone());
    let countries = CountryRepository::new(pool.clone());
    let catalog = CatalogRepository::new(pool.clone());
    let orders = OrderRepository::new(pool.clone());
    let invoices = InvoiceRepository::new(pool.clone());
    let servers = ServerRepository::new(pool.clone());
    let referrals = ReferralRepository::new(pool.clone());
    let tickets = TicketRepository::new(pool.clone());

    // The gateway adapter itself is built per call from the settings cache,
    // so these keys can be filled in later without a restart.
    let key_id = settings.get_or_default("razorpay_key_id", "").await;
    let key_secret = settings.get_or_default("razorpay_key_secret", "").await;
    if key_id.is_empty() || key_secret.is_empty() {
        tracing::warn!("Payment gateway credentials are not configured; checkout will fail");
    }

    let commissions = Arc::new(CommissionService::new(
        pool.clone(),
        users.clone(),
        referrals.clone(),
        catalog.clone(),
        settings.clone(),
    ));

    let user_service = Arc::new(UserService::new(users.clone()));
    let order_service = Arc::new(OrderService::new(
        orders.clone(),
        invoices.clone(),
        servers.clone(),
        catalog.clone(),
        commissions,
        settings.clone(),
    ));
    let referral_service = Arc::new(ReferralService::new(
        users.clone(),
        referrals.clone(),
        settings.clone(),
    ));

    let session_secret =
        std::env::var("SESSION_SECRET").unwrap_or_else(|_| "change-me-in-production".to_string());

    Ok(AppState {
        pool,
        settings,
        user_service,
        order_service,
        referral_service,
        users: Arc::new(users),
        countries: Arc::new(countries),
        catalog: Arc::new(catalog),
        orders: Arc::new(orders),
        invoices: Arc::new(invoices),
        servers: Arc::new(servers),
        referrals: Arc::new(referrals),
        tickets: Arc::new(tickets),
        session_secret,
    })
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/countries", get(handlers::countries::list))
        .route("/countries/{code}", get(handlers::countries::get_by_code))
        .route("/plans", get(handlers::catalog::list_plans))
        .route("/plans/{id}", get(handlers::catalog::get_plan))
        .route("/addons", get(handlers::catalog::list_addons))
        .route("/services", get(handlers::catalog::list_services))
        .route("/payments/webhook", post(handlers::payments::webhook))
}

fn customer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::profile))
        .route(
            "/orders",
            get(handlers::orders::list).post(handlers::orders::create),
        )
        .route("/orders/{id}", get(handlers::orders::get))
        .route("/orders/{id}/cancel", post(handlers::orders::cancel))
        .route("/orders/{id}/checkout", post(handlers::orders::checkout))
        .route("/payments/verify", post(handlers::payments::verify))
        .route("/invoices", get(handlers::invoices::list))
        .route("/invoices/{id}", get(handlers::invoices::get))
        .route("/servers", get(handlers::servers::list))
        .route("/servers/{id}", get(handlers::servers::get))
        .route(
            "/tickets",
            get(handlers::tickets::list).post(handlers::tickets::create),
        )
        .route("/tickets/{id}", get(handlers::tickets::get))
        .route("/tickets/{id}/reply", post(handlers::tickets::reply))
        .route("/tickets/{id}/close", post(handlers::tickets::close))
        .route("/referrals/summary", get(handlers::referrals::summary))
        .route("/referrals/earnings", get(handlers::referrals::earnings))
        .route(
            "/referrals/payouts",
            get(handlers::referrals::list_payouts).post(handlers::referrals::request_payout),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            api::auth_middleware,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::admin;

    Router::new()
        .route(
            "/countries",
            get(admin::countries::list).post(admin::countries::create),
        )
        .route(
            "/countries/{id}",
            put(admin::countries::update).delete(admin::countries::delete),
        )
        .route(
            "/plans",
            get(admin::catalog::list_plans).post(admin::catalog::create_plan),
        )
        .route(
            "/plans/{id}",
            put(admin::catalog::update_plan).delete(admin::catalog::delete_plan),
        )
        .route(
            "/addons",
            get(admin::catalog::list_addons).post(admin::catalog::create_addon),
        )
        .route("/addons/{id}", put(admin::catalog::update_addon))
        .route(
            "/services",
            get(admin::catalog::list_services).post(admin::catalog::create_service),
        )
        .route("/services/{id}", put(admin::catalog::update_service))
        .route("/users", get(admin::users::list))
        .route("/users/{id}", get(admin::users::get))
        .route("/users/{id}/referrer", post(admin::users::set_referrer))
        .route("/orders", get(admin::orders::list))
        .route("/orders/{id}", get(admin::orders::get))
        .route("/orders/{id}/mark-paid", post(admin::orders::mark_paid))
        .route("/orders/{id}/refund", post(admin::orders::refund))
        .route("/servers", get(admin::orders::list_servers))
        .route(
            "/servers/{id}/status",
            post(admin::orders::set_server_status),
        )
        .route(
            "/commission-rules",
            get(admin::referrals::list_rules).post(admin::referrals::create_rule),
        )
        .route(
            "/commission-rules/{id}",
            put(admin::referrals::update_rule).delete(admin::referrals::delete_rule),
        )
        .route(
            "/earnings/{id}/approve",
            post(admin::referrals::approve_earning),
        )
        .route("/payouts", get(admin::referrals::list_payouts))
        .route(
            "/payouts/{id}/process",
            post(admin::referrals::process_payout),
        )
        .route("/tickets", get(admin::tickets::list))
        .route("/tickets/{id}", get(admin::tickets::get))
        .route("/tickets/{id}/reply", post(admin::tickets::reply))
        .route("/tickets/{id}/status", post(admin::tickets::set_status))
        .route(
            "/settings",
            get(admin::settings::get).post(admin::settings::save),
        )
        .layer(axum::middleware::from_fn(api::admin_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state,
            api::auth_middleware,
        ))
}

async fn run_server(pool: PgPool) -> Result<()> {
    let state = build_state(pool).await?;

    let app = Router::new()
        .nest(
            "/api",
            public_routes().merge(customer_routes(state.clone())),
        )
        .nest("/api/admin", admin_routes(state.clone()))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::compression::CompressionLayer::new())
        .layer(tower_http::limit::RequestBodyLimitLayer::new(1024 * 1024))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::set_header::SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            axum::http::HeaderValue::from_static("nosniff"),
        ))
        .layer(tower_http::set_header::SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            axum::http::HeaderValue::from_static("DENY"),
        ));

    let port: u16 = std::env::var("API_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("API_PORT must be a number"))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
