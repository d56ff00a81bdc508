use anyhow::{Context, Result, anyhow};
use chess_playability::{
    Analyzer, EngineConfig, FeatureConfig, FeatureSets, MetricsTable, TimeControl, UciEngine,
    compute_features, position_from_fen,
};
use clap::{Parser, ValueEnum};
use serde_json::{Value as JsonValue, json};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TimeControlArg {
    #[clap(name = "blitz")]
    Blitz,
    #[clap(name = "rapid_classical")]
    RapidClassical,
}

impl From<TimeControlArg> for TimeControl {
    fn from(arg: TimeControlArg) -> Self {
        match arg {
            TimeControlArg::Blitz => TimeControl::Blitz,
            TimeControlArg::RapidClassical => TimeControl::RapidClassical,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Estimate how playable chess positions are for humans")]
struct Cli {
    /// Single position to analyse
    #[arg(long, conflicts_with = "fens")]
    fen: Option<String>,

    /// File with one FEN per line
    #[arg(long, value_name = "FILE")]
    fens: Option<PathBuf>,

    /// Path to UCI engine binary (overrides the engine config)
    #[arg(long, value_name = "FILE")]
    engine: Option<PathBuf>,

    /// Additional args for the engine (pass multiple values)
    #[arg(long, num_args = 1..)]
    engine_args: Option<Vec<String>>,

    /// Engine config JSON
    #[arg(long, value_name = "FILE")]
    engine_config: Option<PathBuf>,

    /// Feature config JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Average rating of the players
    #[arg(long, default_value_t = 1500)]
    elo: u32,

    #[arg(long, value_enum, default_value = "blitz")]
    time_control: TimeControlArg,

    /// Primary search depth
    #[arg(long)]
    depth: Option<u32>,

    /// Engine threads per worker
    #[arg(long)]
    threads: Option<u32>,

    /// Engine hash size in MB per worker
    #[arg(long)]
    hash_mb: Option<u32>,

    /// Per-request engine deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory holding model_<bracket>_<tc>_<target>.onnx files
    #[arg(long, value_name = "DIR", default_value = "models")]
    models: PathBuf,

    /// Feature set JSON
    #[arg(long, value_name = "FILE")]
    feature_sets: Option<PathBuf>,

    /// Model metrics JSON (default: <models>/model_metrics.json when present)
    #[arg(long, value_name = "FILE")]
    metrics: Option<PathBuf>,

    /// Print the feature record instead of model predictions
    #[arg(long)]
    features_only: bool,

    /// Number of parallel engine workers for --fens
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Clone, Debug)]
struct Settings {
    engine: EngineConfig,
    features: FeatureConfig,
    feature_sets: FeatureSets,
    metrics: MetricsTable,
    models: PathBuf,
    elo: u32,
    time_control: TimeControl,
    features_only: bool,
}

fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut engine = match &cli.engine_config {
        Some(p) => EngineConfig::from_file(p)
            .with_context(|| format!("reading engine config {}", p.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &cli.engine {
        engine.path = path.clone();
    }
    if let Some(args) = &cli.engine_args {
        engine.args = args.clone();
    }
    if let Some(threads) = cli.threads {
        engine.threads = threads;
    }
    if let Some(hash_mb) = cli.hash_mb {
        engine.hash_mb = hash_mb;
    }
    if cli.timeout_ms.is_some() {
        engine.timeout_ms = cli.timeout_ms;
    }

    let mut features = match &cli.config {
        Some(p) => FeatureConfig::from_file(p)
            .with_context(|| format!("reading feature config {}", p.display()))?,
        None => FeatureConfig::default(),
    };
    if let Some(depth) = cli.depth {
        features.depth = depth;
    }

    let feature_sets = match &cli.feature_sets {
        Some(p) => FeatureSets::from_file(p)
            .with_context(|| format!("reading feature sets {}", p.display()))?,
        None => FeatureSets::default(),
    };

    let default_metrics = cli.models.join("model_metrics.json");
    let metrics = match &cli.metrics {
        Some(p) => Some(p.clone()),
        None => default_metrics.is_file().then_some(default_metrics),
    };
    let metrics = match metrics {
        Some(p) => MetricsTable::from_file(&p)
            .with_context(|| format!("reading model metrics {}", p.display()))?,
        None => {
            log::info!("no model metrics, certainty will be unknown");
            MetricsTable::default()
        }
    };

    Ok(Settings {
        engine,
        features,
        feature_sets,
        metrics,
        models: cli.models.clone(),
        elo: cli.elo,
        time_control: cli.time_control.into(),
        features_only: cli.features_only,
    })
}

/// Analyses one FEN into a JSON object. Failures are reported inline so
/// a batch keeps going.
fn analyse_fen(
    fen: &str,
    settings: &Settings,
    analyzer: &mut Analyzer,
    engine: &mut UciEngine,
) -> JsonValue {
    let result = position_from_fen(fen).and_then(|position| {
        if settings.features_only {
            let record = compute_features(&position, engine, &settings.features)?;
            Ok(serde_json::to_value(record)?)
        } else {
            let analysis =
                analyzer.analyze(&position, settings.elo, settings.time_control, engine)?;
            Ok(serde_json::to_value(analysis)?)
        }
    });
    match result {
        Ok(value) => json!({ "fen": fen, "success": true, "result": value }),
        Err(e) => {
            log::warn!("{fen}: {e}");
            json!({ "fen": fen, "success": false, "error": e.to_string() })
        }
    }
}

fn new_analyzer(settings: &Settings) -> Analyzer {
    Analyzer::new(
        settings.models.clone(),
        settings.feature_sets.clone(),
        settings.features.clone(),
    )
    .with_metrics(settings.metrics.clone())
}

fn run_single(fen: &str, settings: &Settings) -> Result<()> {
    let mut engine = UciEngine::spawn(&settings.engine)
        .with_context(|| format!("starting engine {}", settings.engine.path.display()))?;
    let mut analyzer = new_analyzer(settings);
    let out = analyse_fen(fen, settings, &mut analyzer, &mut engine);
    println!("{}", serde_json::to_string_pretty(&out)?);
    if out["success"] == JsonValue::Bool(true) {
        Ok(())
    } else {
        Err(anyhow!("analysis of {fen} failed"))
    }
}

fn run_batch(fens: Vec<String>, jobs: usize, settings: Settings) -> Result<()> {
    let total = fens.len();
    let jobs = jobs.clamp(1, total.max(1));
    log::info!("{total} positions, {jobs} workers");

    let (job_tx, job_rx_raw): (Sender<Option<(usize, String)>>, Receiver<Option<(usize, String)>>) =
        mpsc::channel();
    let job_rx = Arc::new(Mutex::new(job_rx_raw));
    let (res_tx, res_rx): (Sender<(usize, JsonValue)>, Receiver<(usize, JsonValue)>) =
        mpsc::channel();
    let settings = Arc::new(settings);

    let mut handles = Vec::with_capacity(jobs);
    for wid in 0..jobs {
        let rx = job_rx.clone();
        let tx = res_tx.clone();
        let settings = settings.clone();
        handles.push(thread::spawn(move || {
            let mut engine = match UciEngine::spawn(&settings.engine) {
                Ok(e) => e,
                Err(e) => {
                    log::error!("worker {wid}: failed to start engine: {e}");
                    return;
                }
            };
            let mut analyzer = new_analyzer(&settings);
            loop {
                let msg = match rx.lock() {
                    Ok(guard) => guard.recv(),
                    Err(_) => break,
                };
                let Ok(Some((index, fen))) = msg else { break };
                let out = analyse_fen(&fen, &settings, &mut analyzer, &mut engine);
                if tx.send((index, out)).is_err() {
                    break;
                }
            }
        }));
    }
    drop(res_tx);

    for (index, fen) in fens.into_iter().enumerate() {
        job_tx.send(Some((index, fen)))?;
    }
    for _ in 0..jobs {
        let _ = job_tx.send(None);
    }

    // results arrive out of order; print them in input order
    let mut results: Vec<Option<JsonValue>> = vec![None; total];
    let mut done = 0usize;
    while let Ok((index, value)) = res_rx.recv() {
        results[index] = Some(value);
        done += 1;
        if done % 100 == 0 {
            log::info!("{done}/{total} positions");
        }
    }
    for handle in handles {
        let _ = handle.join();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for value in results.into_iter().flatten() {
        writeln!(out, "{}", serde_json::to_string(&value)?)?;
    }
    out.flush()?;

    if done < total {
        return Err(anyhow!("only {done} of {total} positions were analysed"));
    }
    log::info!("processed {done} positions");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let settings = build_settings(&cli)?;

    if let Some(fen) = &cli.fen {
        return run_single(fen, &settings);
    }
    let Some(path) = &cli.fens else {
        return Err(anyhow!("either --fen or --fens is required"));
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let fens: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();

    let default_jobs = thread::available_parallelism().map_or(1, |n| n.get()).clamp(1, 8);
    run_batch(fens, cli.jobs.unwrap_or(default_jobs), settings)
}
