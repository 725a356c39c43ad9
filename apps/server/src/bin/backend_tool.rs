//! CLI tool to compare and synchronise the file and database backends.
//!
//! Usage:
//!   cargo run --bin backend-tool -- verify
//!   cargo run --bin backend-tool -- import --from file
//!   cargo run --bin backend-tool -- import --from database

use std::env;

use qa_manager_lib::config::Config;
use qa_manager_lib::db::DbPool;
use qa_manager_lib::file_store::FileStore;
use qa_manager_lib::services::import::import_all;
use qa_manager_lib::services::verification::{VerificationReport, verify_backends};
use qa_manager_lib::store::Backend;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = args[1].as_str();
    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return;
    }
    if !matches!(command, "verify" | "import") {
        eprintln!("Unknown command: {}", command);
        print_usage();
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let file = FileStore::new(config.storage.data_dir.clone());
    if let Err(e) = file.ensure_data_dir().await {
        eprintln!("Error preparing data directory: {}", e);
        std::process::exit(1);
    }

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match command {
        "verify" => verify(&file, &pool).await,
        _ => {
            let from = parse_from_arg(&args);
            import(&file, &pool, from).await;
        }
    }
}

#[derive(Clone, Copy)]
enum Source {
    File,
    Database,
}

fn parse_from_arg(args: &[String]) -> Source {
    let mut i = 2;
    while i < args.len() {
        if (args[i] == "--from" || args[i] == "-f") && i + 1 < args.len() {
            return match args[i + 1].as_str() {
                "file" | "files" => Source::File,
                "database" | "db" | "postgres" => Source::Database,
                other => {
                    eprintln!("Error: --from must be 'file' or 'database', got '{}'", other);
                    std::process::exit(1);
                }
            };
        }
        i += 1;
    }
    eprintln!("Error: --from is required");
    std::process::exit(1);
}

fn print_report(report: &VerificationReport) {
    println!();
    println!(
        "{:<12} {:>6} {:>9} {:>13} {:>17} {:>11}",
        "ENTITY", "FILE", "DATABASE", "ONLY IN FILE", "ONLY IN DATABASE", "MISMATCHED"
    );
    println!("{}", "-".repeat(74));
    for entity in &report.entities {
        println!(
            "{:<12} {:>6} {:>9} {:>13} {:>17} {:>11}",
            entity.entity.as_str(),
            entity.file_count,
            entity.database_count,
            entity.only_in_file.len(),
            entity.only_in_database.len(),
            entity.mismatched.len()
        );
    }

    for entity in report.entities.iter().filter(|e| !e.is_consistent()) {
        println!();
        println!("{}:", entity.entity.as_str());
        for id in &entity.only_in_file {
            println!("  only in file:     {}", id);
        }
        for id in &entity.only_in_database {
            println!("  only in database: {}", id);
        }
        for mismatch in &entity.mismatched {
            println!("  differs:          {} ({})", mismatch.id, mismatch.fields.join(", "));
        }
    }
    println!();
}

async fn verify(file: &FileStore, pool: &DbPool) {
    let report = match verify_backends(file, pool).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error verifying backends: {}", e);
            std::process::exit(1);
        }
    };

    print_report(&report);

    if report.is_consistent() {
        println!("Backends are consistent.");
    } else {
        println!("Backends differ. Run `backend-tool import --from <source>` to copy one over the other.");
        std::process::exit(2);
    }
}

async fn import(file: &FileStore, pool: &DbPool, from: Source) {
    let (source, target, label): (&dyn Backend, &dyn Backend, &str) = match from {
        Source::File => (file as &dyn Backend, pool as &dyn Backend, "file -> database"),
        Source::Database => (pool as &dyn Backend, file as &dyn Backend, "database -> file"),
    };

    let summary = match import_all(source, target).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error importing ({}): {}", label, e);
            std::process::exit(1);
        }
    };

    println!();
    println!("Imported {} records ({}):", summary.total(), label);
    for (kind, copied) in &summary.copied {
        println!("  {:<12} {}", kind.as_str(), copied);
    }
    println!();
}

fn print_usage() {
    println!(
        r#"
Backend Tool

Compares the JSON file backend with PostgreSQL, or copies every record from
one into the other. Records keep their ids and timestamps.

USAGE:
    backend-tool <COMMAND> [OPTIONS]

COMMANDS:
    verify                       Report records missing from or differing between backends
    import --from <SOURCE>       Copy all records from SOURCE (file | database) into the other
    help                         Show this help message

EXIT CODES:
    0  success
    1  error
    2  verify found differences

ENVIRONMENT:
    RUST_ENV         development | production (required)
    DATABASE_URL     PostgreSQL connection string
    QAM_DATA_DIR     Directory holding the JSON files (default: ./data)
"#
    );
}
