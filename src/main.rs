use std::process::ExitCode;

use realms::logger::Logger;
use realms::{cli, discover, AppContext, Config, HostMode, ModuleRegistry, WikiError};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = Logger::init() {
        eprintln!("failed to initialize logging: {e}");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), WikiError> {
    let config = Config::load()?;
    let modules = config.modules.clone();

    let mut ctx = AppContext::new(config, HostMode::detect());
    discover(&mut ctx, &ModuleRegistry::builtin(), modules.as_slice())?;

    let matches = cli::build(&ctx).get_matches();
    cli::dispatch(&ctx, &matches).await
}
