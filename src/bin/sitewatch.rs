//! sitewatch command-line front end.
//!
//! A thin caller over `MonitorEngine`: register URLs, run a scan pass,
//! show the tracked sites or the scan history.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use sitewatch::time::format_scan_time;
use sitewatch::{split_url_input, HttpFetcher, MonitorConfig, MonitorEngine, WatchError};

enum Command {
    Add(Vec<String>),
    Scan,
    List,
    History,
}

struct Cli {
    data_dir: PathBuf,
    timeout: Duration,
    workers: usize,
    command: Command,
}

fn usage() {
    println!("sitewatch - website change monitor");
    println!();
    println!("USAGE:");
    println!("    sitewatch [OPTIONS] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    add <URL>...     Track URLs ('-' reads one URL per line from stdin)");
    println!("    scan             Fetch every tracked URL and report changes");
    println!("    list             Show tracked sites");
    println!("    history          Show past scan passes");
    println!();
    println!("OPTIONS:");
    println!("    -d, --data-dir <DIR>     Directory for state and history [default: .]");
    println!("    -t, --timeout <SECS>     Per-fetch timeout [default: 10]");
    println!("    -w, --workers <N>        Concurrent fetches per scan [default: 1]");
    println!("    -h, --help               Print help information");
}

fn fail(msg: &str) -> ! {
    eprintln!("error: {msg}");
    std::process::exit(2);
}

fn parse_args() -> Cli {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let defaults = MonitorConfig::default();
    let mut data_dir = PathBuf::from(".");
    let mut timeout = defaults.fetch_timeout;
    let mut workers = defaults.fetch_workers;
    let mut command = None;

    let mut i = 0;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i + 1)
                .cloned()
                .unwrap_or_else(|| fail(&format!("{} requires a value", args[i])))
        };
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                data_dir = PathBuf::from(value(i));
                i += 2;
            }
            "--timeout" | "-t" => {
                let raw = value(i);
                let secs: u64 = raw
                    .parse()
                    .unwrap_or_else(|_| fail(&format!("invalid timeout: {raw}")));
                timeout = Duration::from_secs(secs);
                i += 2;
            }
            "--workers" | "-w" => {
                let raw = value(i);
                workers = raw
                    .parse()
                    .unwrap_or_else(|_| fail(&format!("invalid worker count: {raw}")));
                i += 2;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            "add" => {
                command = Some(Command::Add(args[i + 1..].to_vec()));
                break;
            }
            "scan" => {
                command = Some(Command::Scan);
                i += 1;
            }
            "list" => {
                command = Some(Command::List);
                i += 1;
            }
            "history" => {
                command = Some(Command::History);
                i += 1;
            }
            arg => fail(&format!("unknown argument: {arg}")),
        }
    }

    let Some(command) = command else {
        usage();
        std::process::exit(2);
    };

    Cli {
        data_dir,
        timeout,
        workers,
        command,
    }
}

fn read_urls(args: Vec<String>) -> Result<Vec<String>, WatchError> {
    if args.len() == 1 && args[0] == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| WatchError::internal(format!("reading stdin: {e}")))?;
        return Ok(split_url_input(&text));
    }
    Ok(args
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect())
}

fn run(cli: Cli) -> Result<(), WatchError> {
    let config = MonitorConfig {
        fetch_timeout: cli.timeout,
        fetch_workers: cli.workers,
        ..MonitorConfig::in_dir(&cli.data_dir)
    }
    .validate()?;

    let fetcher = HttpFetcher::new(config.fetch_timeout, &config.user_agent)
        .map_err(|e| WatchError::internal(format!("building HTTP client: {e}")))?;
    let engine = MonitorEngine::open(&config, Arc::new(fetcher))?;

    match cli.command {
        Command::Add(args) => {
            let urls = read_urls(args)?;
            if urls.is_empty() {
                fail("enter at least one website URL");
            }
            let added = engine.register(&urls)?;
            println!("Added {added} of {} websites", urls.len());
        }
        Command::Scan => {
            let changed = engine.scan()?;
            if changed.is_empty() {
                println!("Scan complete, no changes detected");
            } else {
                println!("Changes detected in {} websites:", changed.len());
                for url in changed {
                    println!("  {url}");
                }
            }
        }
        Command::List => {
            println!("{:<48} {:<20} {:>8}  STATUS", "WEBSITE", "LAST SCAN", "CHANGES");
            for view in engine.views()? {
                println!(
                    "{:<48} {:<20} {:>8}  {}",
                    view.url, view.last_scan, view.changes, view.status
                );
            }
        }
        Command::History => {
            for record in engine.history()? {
                println!(
                    "{}  {:>4} tracked  {}",
                    format_scan_time(&record.timestamp),
                    record.total_tracked,
                    record.changed_field()
                );
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
