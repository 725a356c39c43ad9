//! CLI tool to recompute every test plan's quality score and cycle counts.
//!
//! Usage:
//!   cargo run --bin recompute-quality
//!   cargo run --bin recompute-quality -- --write

use std::env;
use std::sync::Arc;

use qa_manager_lib::config::Config;
use qa_manager_lib::db::DbPool;
use qa_manager_lib::file_store::FileStore;
use qa_manager_lib::services::Services;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut write = false;
    for arg in &args {
        match arg.as_str() {
            "--write" | "-w" => write = true,
            "help" | "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = if config.storage.needs_database() {
        match DbPool::new(&config).await {
            Ok(p) => Some(Arc::new(p)),
            Err(e) => {
                eprintln!("Error connecting to database: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let file = Arc::new(FileStore::new(config.storage.data_dir.clone()));
    let services = match Services::new(&config.storage, pool, file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error building services: {}", e);
            std::process::exit(1);
        }
    };

    let plans = match services.test_plans.list().await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error listing test plans: {}", e);
            std::process::exit(1);
        }
    };

    if plans.is_empty() {
        println!("No test plans found.");
        return;
    }

    println!();
    println!(
        "{:<38} {:<30} {:>7} {:>7} {:>9}",
        "ID", "NAME", "CASES", "CYCLES", "QUALITY"
    );
    println!("{}", "-".repeat(95));

    let mut failures = 0;
    for plan in &plans {
        match services.test_plans.recompute(&plan.id, write).await {
            Ok(recomputed) => {
                let quality = if recomputed.quality_score < 0.0 {
                    "n/a".to_string()
                } else {
                    format!("{:.2}", recomputed.quality_score)
                };
                println!(
                    "{:<38} {:<30} {:>7} {:>7} {:>9}",
                    recomputed.id,
                    truncate(&recomputed.name, 30),
                    recomputed.total_cases,
                    recomputed.cycles.len(),
                    quality
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error recomputing plan {}: {}", plan.id, e);
            }
        }
    }

    println!();
    if write {
        println!("Recomputed cycles written for {} plan(s).", plans.len() - failures);
    } else {
        println!("Dry run. Pass --write to persist recomputed cycles.");
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn print_usage() {
    println!(
        r#"
Recompute Quality

Recomputes each test plan's quality score and per-cycle counts from its
linked test cases, using the configured storage backends.

USAGE:
    recompute-quality [--write]

OPTIONS:
    -w, --write    Persist the recomputed cycle counts (default: dry run)
    -h, --help     Show this help message
"#
    );
}
