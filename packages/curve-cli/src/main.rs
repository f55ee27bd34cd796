use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod params;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::Filter(args) => commands::filter::execute(args),
        cli::Command::Compact(args) => commands::compact::execute(args),
        cli::Command::Presets(args) => commands::presets::execute(args),
        cli::Command::Replay(args) => commands::replay::execute(args).await,
    };

    std::process::exit(exit_code);
}
