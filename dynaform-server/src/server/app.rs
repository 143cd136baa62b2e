use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use dynaform::collaborators::{AssetStore, Messenger, PaymentGateway};
use dynaform::services::{
    ColumnService, FormDetailService, FormService, InMemoryOtpStore, OptionService,
    PaymentCoordinator, PaymentSettings, SchemaAssembler, SubmissionWriter, SubmitterService,
    ValidationRuleService,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{
    bindings, columns, forms, health, options, payments, submissions, submitters, validations,
};
use crate::integrations::{LocalAssetStore, RazorpayGateway, WhatsAppMessenger};

pub const UPLOADS_PATH: &str = "/uploads";
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub endpoint: String,
    pub instance_id: String,
    pub access_token: String,
}

/// Everything the router needs beyond the database connection.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub cors_origin: Option<String>,
    pub jwt_secret: String,
    pub uploads_dir: PathBuf,
    pub payment_key_id: Option<String>,
    pub payment: PaymentSettings,
    pub messaging: Option<MessagingConfig>,
}

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub forms: FormService,
    pub columns: ColumnService,
    pub details: FormDetailService,
    pub options: OptionService,
    pub rules: ValidationRuleService,
    pub assembler: SchemaAssembler,
    pub writer: SubmissionWriter,
    pub coordinator: PaymentCoordinator,
    pub submitters: SubmitterService,
}

impl AppState {
    /// Wire the services with the adapters named by `config`.
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        let assets: Arc<dyn AssetStore> =
            Arc::new(LocalAssetStore::new(&config.uploads_dir, UPLOADS_PATH));
        let gateway: Option<Arc<dyn PaymentGateway>> = config.payment_key_id.as_ref().map(|key_id| {
            Arc::new(RazorpayGateway::new(key_id.clone(), config.payment.key_secret.clone()))
                as Arc<dyn PaymentGateway>
        });
        let messenger: Option<Arc<dyn Messenger>> = config.messaging.as_ref().map(|m| {
            Arc::new(WhatsAppMessenger::new(
                m.endpoint.clone(),
                m.instance_id.clone(),
                m.access_token.clone(),
            )) as Arc<dyn Messenger>
        });
        Self::from_parts(db, config, assets, gateway, messenger)
    }

    pub fn from_parts(
        db: DatabaseConnection,
        config: &AppConfig,
        assets: Arc<dyn AssetStore>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        messenger: Option<Arc<dyn Messenger>>,
    ) -> Self {
        Self {
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            forms: FormService::new(db.clone()),
            columns: ColumnService::new(db.clone()),
            details: FormDetailService::new(db.clone()),
            options: OptionService::new(db.clone()),
            rules: ValidationRuleService::new(db.clone()),
            assembler: SchemaAssembler::new(db.clone()),
            writer: SubmissionWriter::new(db.clone(), assets.clone()),
            coordinator: PaymentCoordinator::new(
                db.clone(),
                assets,
                gateway,
                config.payment.clone(),
            ),
            submitters: SubmitterService::new(
                db,
                Arc::new(InMemoryOtpStore::new()),
                messenger,
            ),
        }
    }
}

pub async fn create_app(db: DatabaseConnection, config: &AppConfig) -> Result<Router> {
    let state = AppState::new(db, config);
    create_router(state, config)
}

pub fn create_router(state: AppState, config: &AppConfig) -> Result<Router> {
    let cors = match config.cors_origin.as_deref() {
        Some(origin) if origin != "*" => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin '{}'", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    info!("Serving uploads from {}", config.uploads_dir.display());

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .nest_service(UPLOADS_PATH, ServeDir::new(&config.uploads_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Forms
        .route("/forms", get(forms::list_forms).post(forms::create_form))
        .route(
            "/forms/:id",
            get(forms::get_form)
                .put(forms::update_form)
                .delete(forms::delete_form),
        )
        .route("/forms/:id/name", get(forms::form_name))
        .route("/forms/:id/schema", get(forms::form_schema))
        .route("/forms/:id/next-form-no", get(bindings::next_form_no))
        .route("/dashboard/counts", get(forms::dashboard_counts))
        // Columns
        .route("/columns", get(columns::list_columns).post(columns::create_columns))
        .route(
            "/columns/:id",
            put(columns::update_column).delete(columns::delete_column),
        )
        .route("/forms/:id/columns", post(columns::create_bound_column))
        .route("/forms/:id/columns/:column_id", put(columns::rename_bound_column))
        // Bindings
        .route("/bindings", get(bindings::list_bindings).post(bindings::bind_column))
        .route("/bindings/:id", delete(bindings::delete_binding))
        .route("/bindings/:id/sequence", put(bindings::set_sequence))
        .route("/bindings/:id/read-only", put(bindings::set_read_only))
        .route("/bindings/:id/in-use", get(bindings::binding_in_use))
        // Options
        .route("/options", get(options::list_options).post(options::add_option))
        .route("/options/:id", delete(options::delete_option))
        // Validation rules
        .route("/validations/kinds", get(validations::list_kinds))
        .route("/validations", post(validations::add_rule))
        .route(
            "/validations/:id",
            get(validations::get_rule)
                .put(validations::update_rule)
                .delete(validations::delete_rule),
        )
        .route("/forms/:id/validations", get(validations::rules_for_form))
        // Submissions
        .route(
            "/forms/:id/submissions",
            get(submissions::all_values).post(submissions::create_submission),
        )
        .route("/forms/:id/submissions/upload", post(submissions::create_submission_upload))
        .route("/forms/:id/submissions/existing", get(submissions::check_existing))
        .route("/forms/:id/submissions/mine", get(submissions::submitter_values))
        .route(
            "/forms/:id/submissions/:submission_id",
            put(submissions::update_submission).delete(submissions::delete_submission),
        )
        .route(
            "/forms/:id/submissions/:submission_id/upload",
            put(submissions::update_submission_upload),
        )
        .route("/submissions/mine", get(submissions::values_by_submitter))
        .route("/submissions/ledger", get(submissions::ledger))
        // Payments
        .route("/payments/orders", post(payments::create_order))
        .route("/payments/verify", post(payments::verify_payment))
        .route("/payments/verify/upload", post(payments::verify_payment_upload))
        // Submitters
        .route("/submitters", post(submitters::register))
        .route("/submitters/me", get(submitters::me))
        .route("/submitters/otp", post(submitters::issue_otp))
        .route("/submitters/otp/verify", post(submitters::verify_otp))
        .route("/submitters/verified", post(submitters::mark_verified))
}
