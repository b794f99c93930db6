use accutime::prelude::*;
use accutime::{LIBRARY_NAME, VERSION as LIB_VERSION};
use anyhow::Result;
use chrono::{Local, TimeZone};
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use slotmap::{new_key_type, SlotMap};
use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct ShellHighlighter;

impl Highlighter for ShellHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

new_key_type! {
    /// Identifies a running ticker inside the shell's registry.
    struct TickerId;
}

/// Active periodic runs, addressable by a small number the user can type.
#[derive(Default)]
struct Tickers {
    runs: SlotMap<TickerId, PeriodicHandle>,
    handles: HashMap<usize, TickerId>,
    next_handle: usize,
}

impl Tickers {
    fn insert(&mut self, run: PeriodicHandle) -> usize {
        let id = self.runs.insert(run);
        let handle = self.next_handle;
        self.handles.insert(handle, id);
        self.next_handle += 1;
        handle
    }

    fn remove(&mut self, handle: usize) -> Option<PeriodicHandle> {
        let id = self.handles.remove(&handle)?;
        self.runs.remove(id)
    }

    fn stop_all(&mut self) {
        for (_, run) in self.runs.drain() {
            run.stop();
        }
        self.handles.clear();
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    // Embedded at compile time; `logo.log` lives at the crate root.
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    let license_blurb = "
    This software is provided 'as is', without warranty of any kind.
    Distributed under the MIT OR Apache-2.0 license. Use at your own risk.
    ";

    println!("{}", "-".repeat(64).dimmed());
    println!("{}", version_string);
    println!("{}", license_blurb.dimmed());
    println!("{}", "-".repeat(64).dimmed());
}

fn print_help() {
    println!("Available commands:");
    println!("  wait [S]              - Waits S seconds (default 1), aligned to whole seconds.");
    println!("  until <HH:mm:ss>      - Waits until that time today.");
    println!("  comp [MS]             - Shows or sets the compensation offset.");
    println!("  parse <T>             - Parses a time-of-day string.");
    println!("  add <A> <B>           - Adds two time-of-day strings.");
    println!("  sub <A> <B>           - Subtracts B from A.");
    println!("  offset <T>            - Now plus T read as a duration.");
    println!("  resolve <T>           - Timestamp of T today.");
    println!("  every <S>             - Starts an S-second periodic ticker.");
    println!("  stop <H>              - Stops a ticker by its handle.");
    println!("  list                  - Shows active tickers and their handles.");
    println!("  mute | unmute         - Hides or shows ticker output.");
    println!("  exit                  - Quits the shell.");
}

fn format_local(ts: Millis) -> String {
    match Local.timestamp_millis_opt(ts).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => "<out of range>".to_string(),
    }
}

fn parse_seconds(arg: Option<&&str>, usage: &str) -> Option<f64> {
    match arg.map(|s| s.parse::<f64>()) {
        Some(Ok(seconds)) if seconds.is_finite() && seconds >= 0.0 => Some(seconds),
        Some(_) => {
            println!("Error: seconds must be a non-negative number.");
            None
        }
        None => {
            println!("Usage: {}", usage);
            None
        }
    }
}

fn report<T: std::fmt::Display>(result: accutime::error::Result<T>) {
    match result {
        Ok(value) => println!("--> {}", value),
        Err(e) => println!("Error: {}", e),
    }
}

async fn execute(
    args: &[&str],
    waiter: &Waiter,
    tickers: &mut Tickers,
    show_ticks: &Arc<AtomicBool>,
) -> bool {
    let Some(command) = args.first() else {
        return true;
    };
    match *command {
        "wait" => {
            let elapsed = match args.get(1) {
                None => Some(waiter.wait_next_second(None).await),
                Some(_) => match parse_seconds(args.get(1), "wait [SECONDS]") {
                    Some(seconds) => Some(waiter.wait_seconds(seconds, None).await),
                    None => None,
                },
            };
            if let Some(elapsed) = elapsed {
                println!("--> Resumed after {} ms", elapsed);
            }
        }
        "until" => match args.get(1) {
            Some(time) => match waiter.wait_until_time_of_day(time, None).await {
                Ok(elapsed) => println!("--> Reached {} after {} ms", time, elapsed),
                Err(e) => println!("Error: {}", e),
            },
            None => println!("Usage: until <HH:mm:ss>"),
        },
        "comp" => match args.get(1).map(|s| s.parse::<i64>()) {
            Some(Ok(ms)) => println!("--> Compensation set to {} ms", waiter.set_compensation(ms)),
            Some(Err(_)) => println!("Error: compensation must be an integer."),
            None => println!("--> Compensation is {} ms", waiter.get_compensation()),
        },
        "parse" => match args.get(1) {
            Some(time) => report(waiter.parse(time).map(|t| format!("{:?}", t.as_tuple()))),
            None => println!("Usage: parse <HH:mm:ss>"),
        },
        "add" | "sub" => match (args.get(1), args.get(2)) {
            (Some(a), Some(b)) => {
                let result = if *command == "add" {
                    accutime::add_time_string(a, b)
                } else {
                    accutime::subtract_time_string(a, b)
                };
                report(result.map(|hms| format!("{:?}", hms)));
            }
            _ => println!("Usage: {} <HH:mm:ss> <HH:mm:ss>", command),
        },
        "offset" => match args.get(1) {
            Some(time) => report(waiter.add_offset(time, None).map(format_local)),
            None => println!("Usage: offset <HH:mm:ss>"),
        },
        "resolve" => match args.get(1) {
            Some(time) => report(
                waiter
                    .resolve_time_of_day(time, None)
                    .map(|ts| format!("{} ({})", ts, format_local(ts))),
            ),
            None => println!("Usage: resolve <HH:mm:ss>"),
        },
        "every" => {
            if let Some(seconds) = parse_seconds(args.get(1), "every <SECONDS>") {
                if seconds == 0.0 {
                    println!("Error: a ticker needs a period above zero.");
                    return true;
                }
                let visible = show_ticks.clone();
                let clock = waiter.clone();
                let run = waiter.start_periodic(seconds, move |n| {
                    if visible.load(Ordering::Relaxed) {
                        println!("<-- [TICK] {}s ticker #{} at {}", seconds, n, format_local(clock.now_millis()));
                    }
                    Ok(())
                });
                let handle = tickers.insert(run);
                println!("--> Started {}-second ticker with handle: #{}", seconds, handle);
            }
        }
        "stop" => match args.get(1).map(|s| s.parse::<usize>()) {
            Some(Ok(handle)) => match tickers.remove(handle) {
                Some(run) => {
                    run.stop();
                    println!("--> Ticker #{} stopped after {} ticks.", handle, run.ticks());
                }
                None => println!("Error: Invalid handle #{}. Use 'list' to see active tickers.", handle),
            },
            Some(Err(_)) => println!("Error: Handle must be a number (e.g., '0', '1')."),
            None => println!("Usage: stop <HANDLE>"),
        },
        "list" => {
            println!("Active Tickers:");
            let mut handles: Vec<_> = tickers.handles.iter().collect();
            handles.sort_by_key(|(handle, _)| **handle);
            for (handle, id) in handles {
                if let Some(run) = tickers.runs.get(*id) {
                    println!(
                        "  Handle #{}: every {}s, {} ticks, running={}",
                        handle,
                        run.period_seconds(),
                        run.ticks(),
                        run.is_running()
                    );
                }
            }
        }
        "mute" => {
            show_ticks.store(false, Ordering::Relaxed);
            println!("--> Ticker output hidden.");
        }
        "unmute" => {
            show_ticks.store(true, Ordering::Relaxed);
            println!("--> Ticker output shown.");
        }
        "help" => print_help(),
        "exit" => return false,
        other => println!("Unknown command: '{}'. Type 'help'.", other),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_path = env::var("ACCUTIME_CONFIG").unwrap_or_else(|_| "accutime.toml".to_string());
    let config = AccuTimeConfig::load(&config_path)?;
    let waiter = Waiter::from_config(&config);
    info!("{} ready (compensation {} ms)", LIBRARY_NAME.cyan(), waiter.get_compensation());

    let show_ticks = Arc::new(AtomicBool::new(true));
    let mut tickers = Tickers::default();

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ShellHighlighter));

    println!("{} shell is running. Type 'help' for commands or 'exit' to quit.", LIBRARY_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();
                if !execute(&args, &waiter, &mut tickers, &show_ticks).await {
                    break;
                }
            }
            Err(_) => {
                println!("Exiting accushell...");
                break;
            }
        }
    }

    tickers.stop_all();
    Ok(())
}
