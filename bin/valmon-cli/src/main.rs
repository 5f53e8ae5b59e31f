pub mod cmd;
pub mod constants;
pub mod errors;
pub mod report;
pub mod settings;

use cmd::{check::check, config::config, Commands, TopLevel};
use constants::LOG_BASE_NAME;
use settings::Settings;
use valmon_common::logging::{self, LoggerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let TopLevel { config_file, cmd } = argh::from_env();

    let log_config = LoggerConfig::from_env(LOG_BASE_NAME);
    if let Err(e) = logging::init(&log_config) {
        eprintln!("failed to start logging: {e}");
    }

    let settings = Settings::load(config_file).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let result = match cmd {
        Commands::Check(args) => check(args, settings).await,
        Commands::Config(args) => {
            config(args, settings).await;
            Ok(())
        }
    };

    logging::finalize();

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
