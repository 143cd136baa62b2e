use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dynaform::services::PaymentSettings;
use dynaform_server::server::{self, app::AppConfig, app::MessagingConfig, MigrateDirection};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about)]
struct ServerArgs {
    #[clap(short, long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,
    #[clap(short, long, default_value = "3000", env = "PORT", global = true)]
    port: u16,
    #[clap(short, long, default_value = "dynaform.db", env = "DATABASE_PATH", global = true)]
    database: String,
    #[clap(long, env = "CORS_ORIGIN")]
    cors_origin: Option<String>,
    #[clap(long, default_value = "uploads", env = "UPLOADS_DIR")]
    uploads_dir: PathBuf,
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
    #[clap(long, env = "RAZORPAY_KEY_ID")]
    payment_key_id: Option<String>,
    #[clap(long, env = "RAZORPAY_KEY_SECRET", hide_env_values = true)]
    payment_key_secret: Option<String>,
    #[clap(long, default_value = "INR", env = "PAYMENT_CURRENCY")]
    currency: String,
    #[clap(long, env = "MESSAGING_URL")]
    messaging_url: Option<String>,
    #[clap(long, env = "MESSAGING_INSTANCE_ID")]
    messaging_instance_id: Option<String>,
    #[clap(long, env = "MESSAGING_ACCESS_TOKEN", hide_env_values = true)]
    messaging_access_token: Option<String>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply or roll back database migrations
    Migrate {
        #[clap(subcommand)]
        direction: MigrateDirection,
    },
}

impl ServerArgs {
    fn app_config(&self) -> Result<AppConfig> {
        let jwt_secret = self
            .jwt_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set to serve the API"))?;

        let payment_key_secret = self
            .payment_key_secret
            .clone()
            .filter(|s| !s.trim().is_empty());
        if self.payment_key_id.is_some() && payment_key_secret.is_none() {
            anyhow::bail!("RAZORPAY_KEY_SECRET must be set when RAZORPAY_KEY_ID is");
        }

        let messaging = match (
            &self.messaging_url,
            &self.messaging_instance_id,
            &self.messaging_access_token,
        ) {
            (Some(endpoint), Some(instance_id), Some(access_token)) => Some(MessagingConfig {
                endpoint: endpoint.clone(),
                instance_id: instance_id.clone(),
                access_token: access_token.clone(),
            }),
            _ => None,
        };

        Ok(AppConfig {
            cors_origin: self.cors_origin.clone(),
            jwt_secret,
            uploads_dir: self.uploads_dir.clone(),
            payment_key_id: self.payment_key_id.clone(),
            payment: PaymentSettings {
                key_secret: payment_key_secret.unwrap_or_default(),
                currency: self.currency.clone(),
            },
            messaging,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = ServerArgs::parse();
    setup_logging(&args.log_level);

    match &args.command {
        Some(Command::Migrate { direction }) => {
            server::migrate_database(&args.database, *direction).await?;
        }
        Some(Command::Serve) | None => {
            let config = args.app_config()?;
            info!("Starting server on port {}", args.port);
            server::start_server(args.port, &args.database, config).await?;
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "hyper=warn,{}",
            log_level
        )))
        .without_time()
        .init();
}
