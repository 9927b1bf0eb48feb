//! Launcher for one MapReduce job: loads a job configuration file, runs it
//! to completion, and exits with a status code describing what happened.
//!
//! Grounded on `xzhseh-MapReduce-rs/src/bin/mrcoordinator.rs` for the CLI
//! argument handling and status-line style, merged with
//! `original_source/src/python/main.py`'s `__main__` block, which accepts an
//! optional `kill_mapper_idx` positional argument for fault injection.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use mr_engine::mr::config::JobConfig;
use mr_engine::mr::coordinator::Coordinator;
use mr_engine::mr::error::MrError;

fn usage() -> ! {
    eprintln!("Usage: mrcoordinator <config.json> [kill_mapper_idx]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        usage();
    }

    let config_path = PathBuf::from(&args[1]);
    let kill_index = match args.get(2) {
        None => None,
        Some(raw) => match raw.parse::<isize>() {
            // Negative values, canonically -1, are the documented sentinel
            // for "fault injection disabled" and forwarded as such (§4.G, §6).
            Ok(idx) if idx < 0 => None,
            Ok(idx) => Some(idx as usize),
            Err(_) => {
                eprintln!("kill_mapper_idx must be an integer, got {raw:?}");
                return ExitCode::from(2);
            }
        },
    };

    let config = match JobConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::from(2);
        }
    };

    println!(
        "[Coordinator Configuration] {} mapper(s) | {} reducer(s) | application = {}",
        config.number_of_mapper,
        config.number_of_reducer,
        config.application.name()
    );

    let coordinator = Coordinator::new(config, kill_index);
    println!("[Job {}] starting", coordinator.job_id());

    match coordinator.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cause = e.chain().find_map(|cause| cause.downcast_ref::<MrError>());
            let code = match cause {
                Some(MrError::Config(_)) => 2,
                Some(MrError::InputUnreadable(_)) => 3,
                Some(MrError::WorkerSpawn(_)) => 4,
                Some(MrError::Protocol(_)) => 5,
                None => 1,
            };
            eprintln!("[Job {}] failed: {e:#}", coordinator.job_id());
            ExitCode::from(code)
        }
    }
}
