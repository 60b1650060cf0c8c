use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ibcounters::{exposition, Collector, Config};
use parking_lot::Mutex;
use tracing::{error, info};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

fn command() -> Command {
    Command::new(env!("CARGO_BIN_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_about(
            "ibcounters reports InfiniBand port counters, as counts and per-second \
            rates, discovered under the kernel's stats tree.",
        )
        .arg(
            Arg::new("CONFIG")
                .help("Agent configuration file")
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("ROOT")
                .long("root")
                .short('r')
                .help("Directory holding one subdirectory per InfiniBand device")
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("INTERVAL")
                .long("interval")
                .short('i')
                .help("Minimum time between reads of a counter file")
                .action(ArgAction::Set)
                .value_parser(value_parser!(humantime::Duration)),
        )
        .arg(
            Arg::new("LISTEN")
                .long("listen")
                .short('l')
                .help("IP:Port pair to listen on")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("ONCE")
                .long("once")
                .help("Print the metrics once and exit instead of serving them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("VERBOSE")
                .long("verbose")
                .short('v')
                .help("Increase the verbosity")
                .action(ArgAction::Count),
        )
}

fn main() {
    let args = command().get_matches();

    let config = match config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error loading config: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.log().level()))
        .with_writer(std::io::stderr)
        .init();

    let result = if args.get_flag("ONCE") {
        once(&config)
    } else {
        serve(&config)
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}

/// Load the config file, if any, and apply command line overrides.
fn config(args: &ArgMatches) -> ibcounters::Result<Config> {
    let mut config = match args.get_one::<PathBuf>("CONFIG") {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(root) = args.get_one::<PathBuf>("ROOT") {
        config.general_mut().set_root(root.clone());
    }

    if let Some(interval) = args.get_one::<humantime::Duration>("INTERVAL") {
        config.general_mut().set_interval(interval.to_string());
    }

    if let Some(listen) = args.get_one::<String>("LISTEN") {
        config.general_mut().set_listen(listen.clone());
    }

    let verbose = args.get_count("VERBOSE");
    let level = config.log().level().raise(verbose);
    config.log_mut().set_level(level);

    config.check()?;

    Ok(config)
}

fn once(config: &Config) -> anyhow::Result<()> {
    let mut collector = Collector::new(config).context("failed to discover ports")?;

    // rates need a second reading
    std::thread::sleep(collector.interval());

    print!("{}", exposition::human(&collector.snapshot()));

    collector.shutdown();

    Ok(())
}

fn serve(config: &Config) -> anyhow::Result<()> {
    let collector = Collector::new(config).context("failed to discover ports")?;

    info!(
        "reporting {} metrics from {} ports",
        collector.metric_count(),
        collector.registry().len()
    );

    let collector = Arc::new(Mutex::new(collector));
    let listen = config.general().listen()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(1)
        .thread_name("ibcounters")
        .build()
        .context("failed to launch async runtime")?;

    rt.block_on(exposition::http::serve(
        listen,
        collector.clone(),
        shutdown_signal(tokio::signal::ctrl_c()),
    ))
    .context("failed to run http server")?;

    collector.lock().shutdown();

    Ok(())
}

/// Resolves once `signal` fires. If the signal handler could not be
/// installed this never resolves, and the agent keeps serving.
async fn shutdown_signal(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            error!("unable to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
