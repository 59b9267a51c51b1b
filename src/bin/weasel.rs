//! weasel CLI - distributed weasel-program genetic algorithm
//!
//! Commands:
//!   weasel run          - coordinator and workers in one process
//!   weasel coordinate   - coordinator waiting for TCP workers
//!   weasel work         - worker connecting to a coordinator
//!   weasel init-config  - write a default run configuration

use std::env;
use tokio::sync::mpsc;
use weasel_swarm::network::tcp::{accept_workers, connect_worker};
use weasel_swarm::swarm::{run_local, Coordinator, RunConfig, RunEvent, RunSummary, WorkerAgent};

const DEFAULT_WORKERS: usize = 4;

fn print_usage() {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════╗
║        Weasel Swarm v0.1 - distributed weasel program        ║
╚══════════════════════════════════════════════════════════════╝

Usage: weasel <command> [options]

Commands:
  run          [config.json] [workers]            Run coordinator + workers locally
  coordinate   <addr> <workers> [config.json]     Coordinate TCP workers on <addr>
  work         <addr>                             Breed for the coordinator at <addr>
  init-config  <path>                             Write the default configuration

Examples:
  weasel run
  weasel run weasel.json 8
  weasel coordinate 127.0.0.1:7878 4 weasel.json
  weasel work 127.0.0.1:7878
  weasel init-config weasel.json

Set RUST_LOG=debug to see every bred offspring.
"#
    );
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]).await,
        "coordinate" => cmd_coordinate(&args[2..]).await,
        "work" => cmd_work(&args[2..]).await,
        "init-config" => cmd_init_config(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }
}

/// Load a configuration file, or the defaults when no path is given
fn load_config(path: Option<&String>) -> Option<RunConfig> {
    match path {
        Some(path) => match RunConfig::load(path) {
            Ok(config) => {
                println!("  Loaded configuration from {}", path);
                Some(config)
            }
            Err(e) => {
                eprintln!("  Failed to load {}: {}", path, e);
                None
            }
        },
        None => Some(RunConfig::default()),
    }
}

fn parse_workers(arg: Option<&String>) -> Option<usize> {
    match arg {
        None => Some(DEFAULT_WORKERS),
        Some(raw) => match raw.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                eprintln!("  workers must be a number, got '{}'", raw);
                None
            }
        },
    }
}

/// Print progress events as they arrive
fn spawn_event_printer() -> (mpsc::UnboundedSender<RunEvent>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Started {
                    run_id,
                    target,
                    population_size,
                    workers,
                } => {
                    println!(
                        "  Run {}: evolving toward '{}' ({} candidates, {} workers)",
                        run_id, target, population_size, workers
                    );
                }
                RunEvent::Generation(report) => {
                    println!(
                        "  [{:>5}] {}  best={:.3} mean={:.3} children={}",
                        report.generation,
                        report.best,
                        report.best_fitness,
                        report.mean_fitness,
                        report.total_children
                    );
                }
                RunEvent::Finished(summary) => {
                    println!("  {}", summary.summary());
                }
            }
        }
    });
    (tx, handle)
}

fn print_result(summary: &RunSummary) {
    println!();
    println!("  Final:       {}", summary.best);
    println!("  Generations: {}", summary.generations);
    println!("  Children:    {}", summary.total_children);
    if !summary.converged {
        println!("  (stopped at the generation limit before reaching the target)");
    }
}

async fn cmd_run(args: &[String]) {
    let Some(config) = load_config(args.first()) else {
        return;
    };
    let Some(workers) = parse_workers(args.get(1)) else {
        return;
    };

    let (tx, printer) = spawn_event_printer();
    let outcome = run_local(config, workers, Some(tx)).await;
    let _ = printer.await;

    match outcome {
        Ok(run) => {
            print_result(&run.summary);
            for report in &run.workers {
                println!(
                    "  {}: bred {} offspring, rejected {}",
                    report.id, report.bred, report.rejected
                );
            }
        }
        Err(e) => eprintln!("  Run failed: {}", e),
    }
}

async fn cmd_coordinate(args: &[String]) {
    if args.len() < 2 {
        eprintln!("Usage: weasel coordinate <addr> <workers> [config.json]");
        return;
    }
    let addr = &args[0];
    let Some(workers) = parse_workers(args.get(1)) else {
        return;
    };
    let Some(config) = load_config(args.get(2)) else {
        return;
    };
    if let Err(e) = config.validate(workers) {
        eprintln!("  {}", e);
        return;
    }

    let mut link = match accept_workers(addr.as_str(), workers).await {
        Ok(link) => link,
        Err(e) => {
            eprintln!("  Failed to accept workers on {}: {}", addr, e);
            return;
        }
    };

    let (tx, printer) = spawn_event_printer();
    let mut coordinator = Coordinator::new(config).with_events(tx);
    let outcome = coordinator.run(&mut link).await;
    drop(coordinator);
    let _ = printer.await;

    match outcome {
        Ok(summary) => print_result(&summary),
        Err(e) => eprintln!("  Run failed: {}", e),
    }
}

async fn cmd_work(args: &[String]) {
    let Some(addr) = args.first() else {
        eprintln!("Usage: weasel work <addr>");
        return;
    };

    let link = match connect_worker(addr.as_str()).await {
        Ok(link) => link,
        Err(e) => {
            eprintln!("  Failed to connect to {}: {}", addr, e);
            return;
        }
    };

    let mut agent = WorkerAgent::new(link);
    match agent.run().await {
        Ok(report) => println!(
            "  Worker done: bred {} offspring, rejected {}",
            report.bred, report.rejected
        ),
        Err(e) => eprintln!("  Worker failed: {}", e),
    }
}

fn cmd_init_config(args: &[String]) {
    let Some(path) = args.first() else {
        eprintln!("Usage: weasel init-config <path>");
        return;
    };
    match RunConfig::default().save(path) {
        Ok(()) => println!("  Wrote default configuration to {}", path),
        Err(e) => eprintln!("  Failed to write {}: {}", path, e),
    }
}
