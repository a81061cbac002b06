use clap::Parser;
use credvault::cli::{commands, join_words, output, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so they never mix with delivery output.
    let filter = EnvFilter::try_from_env("CREDVAULT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("credvault=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => commands::get::execute(&cli, ""),
        Some(Commands::Get { ref name }) => commands::get::execute(&cli, &join_words(name)),
        Some(Commands::Save { ref name }) => commands::save::execute(&cli, &join_words(name)),
        Some(Commands::List { ref group }) => commands::list::execute(&cli, &join_words(group)),
        Some(Commands::Init) => commands::init::execute(&cli),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
