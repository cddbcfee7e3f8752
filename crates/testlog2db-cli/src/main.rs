use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod discover;
mod run;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = args::Cli::parse();
    let code = match run::run(&cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("FATAL ERROR ({}): {err}", err.prefix());
            err.exit_code()
        }
    };
    std::process::exit(code);
}
