use log::error;
use noters_http::http;
use noters_http::setup::{arguments, logging};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::setup_log();

    let config = match arguments::handle_args() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed starting up: {:#}", anyhow::Error::new(e));
            return ExitCode::FAILURE;
        }
    };

    match http::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", anyhow::Error::new(e));
            ExitCode::FAILURE
        }
    }
}
