use anyhow::Result;
use clap::Parser;
use variance_wizard::{cli, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let headless = args.is_headless();

    let target = if headless || cfg!(not(feature = "tui")) {
        logging::LogTarget::Stderr
    } else {
        logging::LogTarget::Directory(args.log_dir.clone().unwrap_or_else(logging::default_log_dir))
    };
    let _log_guard = logging::init(target, &args.log_level)?;

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success for headless modes
            if headless {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            Err(e)
        }
    }
}
