use clap::Parser;
use eventscape::app::App;
use eventscape::cli::Args;
use eventscape::config::Config;
use eventscape::logging::setup_logging;
use std::process::ExitCode;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config and setup logging first so startup failures are logged
    let config = Config::load().expect("Failed to load config");
    setup_logging(&config, args.tracing);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting eventscape"
    );

    let app = match App::new(config, args.store) {
        Ok(app) => app,
        Err(e) => {
            error!(error = ?e, "Failed to initialize application");
            return ExitCode::FAILURE;
        }
    };

    match app.run(args.command).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "command failed");
            ExitCode::FAILURE
        }
    }
}
