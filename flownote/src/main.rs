use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use flownote::cli::args::Cli;
use flownote::cli::commands::{execute_command, print_help};
use flownote::cli::{output, parse_exit_code, UNSUPPORTED_COMMAND};
use flownote::config::Settings;
use flownote::exitcode;
use flownote::infrastructure::di::ServiceContainer;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::InvalidSubcommand => {
            output::error(UNSUPPORTED_COMMAND);
            process::exit(exitcode::USAGE);
        }
        Err(err) => {
            let _ = err.print();
            process::exit(parse_exit_code(&err));
        }
    };

    let Some(command) = cli.command.as_ref() else {
        print_help();
        process::exit(exitcode::OK);
    };

    setup_logging(cli.debug);

    let settings = match Settings::load(cli.config_file.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            output::error(&e);
            process::exit(e.exit_code());
        }
    };

    let workdir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                output::error(&format!("cannot determine working directory: {e}"));
                process::exit(exitcode::FAILURE);
            }
        },
    };
    tracing::debug!("workdir: {}", workdir.display());

    let container = match ServiceContainer::new(settings, workdir) {
        Ok(container) => container,
        Err(e) => {
            output::error(&e);
            process::exit(exitcode::FAILURE);
        }
    };

    if let Err(e) = execute_command(command, &container) {
        output::error(&e);
        process::exit(e.exit_code());
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // HTTP internals drown the command trace at debug level
    let noisy_modules = ["hyper", "reqwest", "rustls"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
