use clap::Parser;
use keg_cli::cli::{Cli, Commands, JSON_MODE};
use keg_cli::error_fmt::{exit_code_for_error, format_error_json, humanize};
use keg_cli::{app, logging, replay, serve, status};

fn run(cli: &Cli) -> eyre::Result<()> {
    let cfg = app::load_config(cli.config.as_deref())?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);

    match &cli.cmd {
        Commands::Serve { bind } => serve::run_serve(&cfg, bind.as_deref()),
        Commands::Replay { trace, keg } => replay::run_replay(&cfg, trace, *keg, cli.json),
        Commands::Status => status::run_status(&cfg, cli.json),
    }
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(&cli) {
        tracing::error!(error = %err, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
