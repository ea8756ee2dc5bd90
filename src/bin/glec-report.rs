//! glec-report - export admin content statistics as CSV reports
//!
//! Logs in to the admin API (or reuses a token), loads every record of the
//! requested content types and writes one report per type.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;

use glec_admin::calendar::kst;
use glec_admin::client::AdminApiClient;
use glec_admin::content::ContentKind;
use glec_admin::insights::Insights;
use glec_admin::logging::{self, LogLevel};
use glec_admin::report::{self, ReportContext, DEFAULT_DATA_SOURCE};

#[derive(Parser)]
#[command(name = "glec-report")]
#[command(about = "Export GLEC admin content statistics as CSV reports")]
#[command(version)]
struct Cli {
    /// Admin API base URL
    #[arg(long, env = "GLEC_API_URL", default_value = "http://127.0.0.1:3001")]
    base_url: String,

    /// Admin email used to log in
    #[arg(long, env = "ADMIN_EMAIL")]
    email: Option<String>,

    /// Admin password used to log in
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Existing bearer token instead of email/password
    #[arg(long, env = "GLEC_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Content type to export (blog, library, video, notice, press).
    /// Repeat for several; all types when omitted.
    #[arg(short, long = "kind")]
    kinds: Vec<ContentKind>,

    /// Directory the reports are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Label for the report footer
    #[arg(long, env = "REPORT_DATA_SOURCE", default_value = DEFAULT_DATA_SOURCE)]
    data_source: String,

    /// Log verbosity on stderr
    #[arg(long, default_value = "warn")]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_console(cli.log_level);

    let client = AdminApiClient::new(&cli.base_url);
    let token = match (&cli.token, &cli.email, &cli.password) {
        (Some(token), _, _) => token.clone(),
        (None, Some(email), Some(password)) => {
            let login = client
                .login(email, password)
                .await
                .with_context(|| format!("Login to {} failed", cli.base_url))?;
            tracing::info!(user = %login.user.email, role = %login.user.role, "Logged in");
            login.token
        }
        _ => bail!("Provide --token, or --email together with --password"),
    };

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("Cannot create {}", cli.out_dir.display()))?;

    let kinds = if cli.kinds.is_empty() {
        ContentKind::ALL.to_vec()
    } else {
        cli.kinds.clone()
    };

    for kind in kinds {
        let items = client
            .list_all(&token, kind)
            .await
            .with_context(|| format!("Failed to load {}", kind.title()))?;
        let insights = Insights::from_items(kind, &items);

        let ctx = ReportContext::new(Utc::now().with_timezone(&kst()))
            .with_data_source(cli.data_source.clone());
        let document = report::format_report(&insights, &items, &ctx);
        let file_name = report::report_file_name(kind, ctx.file_date());
        let path = report::write_report(&cli.out_dir, &file_name, &document)?;

        println!(
            "{}: {} items, {} views -> {}",
            kind.title(),
            insights.base.total_items,
            insights.base.total_views,
            path.display()
        );
    }

    Ok(())
}
