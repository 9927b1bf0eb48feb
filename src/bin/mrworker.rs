//! Worker process entry point: runs exactly one map or reduce task, reports
//! its progress over the wire protocol on stdout, then exits.
//!
//! Grounded on `xzhseh-MapReduce-rs/src/bin/mrworker.rs` for the CLI
//! argument handling, and on `original_source/src/python/map.py`'s
//! `start_mapper`/`original_source/src/python/reduce.py`'s `start_reducer`,
//! which emit an in-progress status before the task body and a done status
//! after it.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use mr_engine::mr::function::Application;
use mr_engine::mr::job::{JobId, JobLayout};
use mr_engine::mr::protocol::{unix_now, WorkerMessage};
use mr_engine::mr::worker;

fn usage() -> ! {
    eprintln!(
        "Usage: mrworker <map|reduce> <job_id> <tmp_root> <output_root> <index> <other_count> <application>"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() != 8 {
        usage();
    }

    let role = args[1].as_str();
    let job_id = match args[2].parse::<u64>() {
        Ok(n) => JobId(n),
        Err(_) => usage(),
    };
    let tmp_root = PathBuf::from(&args[3]);
    let output_root = PathBuf::from(&args[4]);
    let index: usize = match args[5].parse() {
        Ok(n) => n,
        Err(_) => usage(),
    };
    let other_count: usize = match args[6].parse() {
        Ok(n) => n,
        Err(_) => usage(),
    };
    let application = match Application::by_name(&args[7]) {
        Some(app) => app,
        None => {
            eprintln!("unknown application {:?}", args[7]);
            return ExitCode::from(2);
        }
    };

    let layout = JobLayout::rooted(job_id, tmp_root, output_root);

    println!("{}", WorkerMessage::in_progress(unix_now()).to_line());

    let result = match role {
        "map" => worker::run_map(&layout, application, index, other_count)
            .await
            .map(|active_reducers| {
                println!("{}", WorkerMessage::active_reducers(active_reducers).to_line());
            }),
        "reduce" => worker::run_reduce(&layout, application, index, other_count).await,
        other => {
            eprintln!("unknown role {other:?}, expected map or reduce");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => {
            println!("{}", WorkerMessage::done(unix_now()).to_line());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[{role} #{index}] failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
