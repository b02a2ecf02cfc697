use std::path::{Path, PathBuf};

use anyhow::Context;
use careline_core::{LinearModel, StoreConfig};
use careline_records::{
    evidence_queries, extract_features, literature_query, patient_context, predict_lifespan,
    psa_trend, EvidenceQueries, NoteStore, PsaTrend, VisitStore,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "careline-cli",
    about = "Đọc hồ sơ bệnh nhân CSV: ghi chú lâm sàng, vector đặc trưng và dự đoán tuổi thọ."
)]
struct Args {
    /// File JSON đổi tên cột (StoreConfig).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ghi log chi tiết ra stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// In các dòng `ngày: ghi chú` của bệnh nhân.
    Notes {
        #[arg(short, long)]
        records: PathBuf,
        #[arg(short, long)]
        patient: i64,
    },
    /// In ngữ cảnh thời gian dạng JSON.
    Context {
        #[arg(short, long)]
        records: PathBuf,
        #[arg(short, long)]
        patient: i64,
    },
    /// In vector đặc trưng dạng JSON.
    Features {
        #[arg(long)]
        visits: PathBuf,
        #[arg(short, long)]
        patient: i64,
    },
    /// Dự đoán số năm sống bằng mô hình tuyến tính.
    Predict {
        #[arg(long)]
        visits: PathBuf,
        #[arg(short, long)]
        model: PathBuf,
        #[arg(short, long)]
        patient: i64,
    },
    /// In truy vấn tìm y văn dựa trên ghi chú.
    Evidence {
        #[arg(short, long)]
        records: PathBuf,
        #[arg(short, long)]
        patient: i64,
    },
}

#[derive(Serialize)]
struct EvidenceReport {
    patient_id: i64,
    psa_trend: PsaTrend,
    queries: EvidenceQueries,
    literature_query: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Notes { records, patient } => {
            let store = load_notes(&records, &config)?;
            let context = patient_context(patient, &store)?;
            if !context.temporal_context.is_empty() {
                println!("{}", context.temporal_context);
            }
        }
        Command::Context { records, patient } => {
            let store = load_notes(&records, &config)?;
            let context = patient_context(patient, &store)?;
            println!("{}", serde_json::to_string_pretty(&context)?);
        }
        Command::Features { visits, patient } => {
            let store = load_visits(&visits, &config)?;
            let features = extract_features(patient, &store)?;
            println!("{}", serde_json::to_string_pretty(&features)?);
        }
        Command::Predict {
            visits,
            model,
            patient,
        } => {
            let store = load_visits(&visits, &config)?;
            let json = std::fs::read_to_string(&model)
                .with_context(|| format!("Không đọc được file {:?}", model))?;
            let model = LinearModel::from_json_str(&json)?;
            let years = predict_lifespan(patient, &store, &model)?;
            println!("Predicted lifespan: {years:.2} years");
        }
        Command::Evidence { records, patient } => {
            let store = load_notes(&records, &config)?;
            let context = patient_context(patient, &store)?;
            let report = EvidenceReport {
                patient_id: patient,
                psa_trend: psa_trend(&context.temporal_context),
                queries: evidence_queries(&context.temporal_context),
                literature_query: literature_query(&context.temporal_context),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StoreConfig> {
    let Some(path) = path else {
        return Ok(StoreConfig::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Không đọc được file {:?}", path))?;
    let config: StoreConfig = serde_json::from_str(&data)
        .with_context(|| format!("Config không hợp lệ: {:?}", path))?;
    tracing::debug!(?config, "loaded store config");
    Ok(config)
}

fn load_visits(path: &Path, config: &StoreConfig) -> anyhow::Result<VisitStore> {
    VisitStore::from_path(path, config)
        .with_context(|| format!("Không đọc được bảng khám {:?}", path))
}

fn load_notes(path: &Path, config: &StoreConfig) -> anyhow::Result<NoteStore> {
    NoteStore::from_path(path, config)
        .with_context(|| format!("Không đọc được hồ sơ {:?}", path))
}
