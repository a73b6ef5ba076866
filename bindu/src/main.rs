//! Command-line driver for the Bindu pipeline.
//!
//! # Usage
//!
//! ```bash
//! bindu generate 10                 # write synthetic scan fixtures
//! bindu ingest synthetic_data/*.scan
//! bindu scans 5                     # latest scans with point bounds
//! bindu analyze                     # run every catalog query
//! bindu analyze --query 5           # one query, summary printed as JSON
//! bindu octomap                     # export latest scans to the map builder
//! bindu pipeline                    # generate, ingest, inspect, build map
//! bindu --config my.yaml scans
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use bindu::config::BinduConfig;
use bindu::pipeline::fixture_files;
use bindu::synth::save_synthetic_scans;
use bindu::{
    AnalysisEngine, MapExporter, Pipeline, QueryCatalog, ScanStore, SyntheticScanGenerator,
};

fn main() {
    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let config = match &cli.config_path {
        Some(path) => BinduConfig::load(path),
        None => BinduConfig::load_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level))
        .init();

    if let Err(e) = run(&config, cli.command) {
        log::error!("{}", e);
        process::exit(1);
    }
}

enum Command {
    Generate { count: Option<usize> },
    Ingest { inputs: Vec<PathBuf> },
    Scans { limit: usize },
    Analyze { query: Option<u32> },
    Octomap,
    Pipeline,
}

struct Cli {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut config_path = None;
    let mut positional: Vec<&str> = Vec::new();
    let mut query = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).ok_or("--config requires a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "--query" | "-q" => {
                i += 1;
                let value = args.get(i).ok_or("--query requires a number")?;
                query = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| format!("Invalid query number: {}", value))?,
                );
            }
            "--help" | "-h" => {
                return Err("Help requested".to_string());
            }
            arg if !arg.starts_with('-') => positional.push(arg),
            _ => {
                return Err(format!("Unknown argument: {}", args[i]));
            }
        }
        i += 1;
    }

    let (name, rest) = positional.split_first().ok_or("Missing command")?;
    let number = |value: Option<&&str>| -> Result<Option<usize>, String> {
        value
            .map(|v| v.parse::<usize>().map_err(|_| format!("Invalid number: {}", v)))
            .transpose()
    };

    let command = match *name {
        "generate" => Command::Generate {
            count: number(rest.first())?,
        },
        "ingest" => {
            if rest.is_empty() {
                return Err("ingest requires at least one file or directory".to_string());
            }
            Command::Ingest {
                inputs: rest.iter().map(PathBuf::from).collect(),
            }
        }
        "scans" => Command::Scans {
            limit: number(rest.first())?.unwrap_or(10),
        },
        "analyze" => Command::Analyze { query },
        "octomap" => Command::Octomap,
        "pipeline" => Command::Pipeline,
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(Cli {
        config_path,
        command,
    })
}

fn print_usage(program: &str) {
    eprintln!(
        r#"Usage: {} [--config <file>] <command>

Commands:
  generate [count]        Write synthetic scan fixtures
  ingest <file|dir>...    Transform and store scan fixtures
  scans [limit]           List the latest scans with point bounds
  analyze [--query N]     Run catalog queries and write reports
  octomap                 Build a map from the latest scans
  pipeline                Generate, ingest, inspect and build a map

Options:
  -c, --config <file>     Configuration file (default: configs/bindu.yaml)
  -q, --query <N>         Single query for `analyze`
  -h, --help              Show this help

Environment:
  RUST_LOG                Override the configured log level"#,
        program
    );
}

fn run(config: &BinduConfig, command: Command) -> bindu::Result<()> {
    let store = ScanStore::open(&config.storage.database_path)?
        .with_busy_timeout(config.storage.busy_timeout());

    match command {
        Command::Generate { count } => {
            generate(config, count.unwrap_or(config.synthetic.scan_count))?;
        }
        Command::Ingest { inputs } => {
            let mut files = Vec::new();
            for input in inputs {
                if input.is_dir() {
                    files.extend(fixture_files(&input)?);
                } else {
                    files.push(input);
                }
            }
            ingest(config, store, &files);
        }
        Command::Scans { limit } => print_scans(config, store, limit)?,
        Command::Analyze { query } => analyze(config, store, query)?,
        Command::Octomap => {
            MapExporter::from_config(store, &config.octomap).export_latest(config.octomap.scan_limit)?;
        }
        Command::Pipeline => {
            log::info!("=== Starting LiDAR data pipeline ===");
            log::info!("1. Generating synthetic LiDAR data");
            let files = generate(config, config.synthetic.scan_count)?;

            log::info!("2. Storing scans in {}", config.storage.database_path);
            ingest(config, store.clone(), &files);

            log::info!("3. Inspecting latest scans");
            print_scans(config, store.clone(), config.octomap.scan_limit)?;

            log::info!("4. Creating map from point cloud data");
            match MapExporter::from_config(store, &config.octomap).export_latest(config.octomap.scan_limit) {
                Ok(artifact) => log::info!("Created map {}", artifact.file_path),
                Err(e) => log::error!("Error creating map: {}", e),
            }
            log::info!("=== Pipeline complete ===");
        }
    }
    Ok(())
}

fn generate(config: &BinduConfig, count: usize) -> bindu::Result<Vec<PathBuf>> {
    let mut generator = SyntheticScanGenerator::from_config(&config.synthetic);
    let scans = generator.generate_multiple(count)?;
    save_synthetic_scans(Path::new(&config.synthetic.fixture_dir), &scans)
}

fn ingest(config: &BinduConfig, store: ScanStore, files: &[PathBuf]) {
    let pipeline = Pipeline::from_config(store, &config.sensor);
    let report = pipeline.ingest_files(files);
    log::info!(
        "Ingested {} of {} scans",
        report.ingested.len(),
        files.len()
    );
    for (index, e) in &report.failures {
        log::error!("{}: {}", files[*index].display(), e);
    }
}

fn print_scans(config: &BinduConfig, store: ScanStore, limit: usize) -> bindu::Result<()> {
    let pipeline = Pipeline::from_config(store.clone(), &config.sensor);
    let summaries = store.latest_scans(limit)?;
    let bounds = pipeline.latest_bounds(limit)?;
    println!("Found {} scans in database:", summaries.len());
    for (scan, (_, count, extent)) in summaries.iter().zip(bounds) {
        println!("Scan ID: {}, Timestamp: {}", scan.scan_id, scan.timestamp);
        println!("Point cloud contains {} points", count);
        if let Some(b) = extent {
            println!("  X: min={:.2}, max={:.2}", b.min.x, b.max.x);
            println!("  Y: min={:.2}, max={:.2}", b.min.y, b.max.y);
            println!("  Z: min={:.2}, max={:.2}", b.min.z, b.max.z);
        }
    }
    Ok(())
}

fn analyze(config: &BinduConfig, store: ScanStore, query: Option<u32>) -> bindu::Result<()> {
    let catalog = match &config.analysis.catalog_path {
        Some(path) => QueryCatalog::load_file(Path::new(path))?,
        None => QueryCatalog::builtin()?,
    };
    let engine = AnalysisEngine::new(store, catalog).with_render(config.analysis.render);

    if let Some(number) = query {
        let summary = engine.summarize(number)?;
        let json = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{}", json);
        return Ok(());
    }

    println!("Available analyses:");
    for q in engine.catalog().iter() {
        println!("{}. {}", q.number, q.description);
    }
    let report = engine.run_all(Some(Path::new(&config.analysis.output_dir)))?;
    for (number, e) in &report.failures {
        log::error!("Error analyzing query {}: {}", number, e);
    }
    println!(
        "Analysis complete: {} with data, {} empty, {} failed (output in {})",
        report.completed.len(),
        report.empty.len(),
        report.failures.len(),
        config.analysis.output_dir
    );
    Ok(())
}
