use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use costdoc::cable::{Circuit, DeratingFactors, Phase};
use costdoc::storage::fs::sink_from_settings;
use costdoc::{
    artifact_file_name, CableSchedule, CableScheduleDocument, CostReport, CostReportDocument,
    DocumentSource, PublishRequest, RenderedReport, ReportKind, ReportRenderer, Settings,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Renders and publishes cost reports and cable schedules.
///
/// Fonts are looked up under `assets/fonts` or the directory named by `COSTDOC_FONTS_DIR`.
#[derive(Parser)]
#[command(author, version, about = "Cost report and cable schedule PDF generator")]
struct Cli {
    /// Settings file (TOML); defaults apply when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report to a local PDF file.
    Render {
        #[command(flatten)]
        input: InputArgs,
        /// Output file.
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Render a report and upload it to storage.
    Publish {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Delete a published artifact and its metadata.
    Delete {
        /// Artifact id.
        id: Uuid,
    },

    /// List the artifacts published for a report.
    List {
        /// Report id.
        report_id: String,
    },

    /// Check every cable in a schedule.
    Cable {
        /// Cable schedule JSON file.
        input: PathBuf,
    },

    /// Recommend a conductor size for a single circuit.
    #[command(name = "size-cable", aliases = ["size_cable"])]
    SizeCable {
        /// Load current in A.
        #[arg(long)]
        load: f64,
        /// Route length in m.
        #[arg(long)]
        length: f64,
        /// Supply voltage in V.
        #[arg(long, default_value_t = 400.0)]
        voltage: f64,
        /// Supply configuration.
        #[arg(long, value_enum, default_value_t = PhaseArg::Three)]
        phase: PhaseArg,
        /// Voltage drop limit in percent; the configured limit applies when omitted.
        #[arg(long)]
        limit: Option<f64>,
        /// Combined derating factor.
        #[arg(long, default_value_t = 1.0)]
        derating: f64,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Report or schedule JSON file.
    input: PathBuf,
    /// Kind of document in the input file.
    #[arg(long, value_enum, default_value_t = KindArg::Cost)]
    kind: KindArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Cost,
    Cable,
}

#[derive(Clone, Copy, ValueEnum)]
enum PhaseArg {
    Single,
    Three,
}

impl From<PhaseArg> for Phase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Single => Phase::Single,
            PhaseArg::Three => Phase::Three,
        }
    }
}

struct Loaded {
    rendered: RenderedReport,
    request: PublishRequest,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "costdoc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render { input, output } => {
            let loaded = render_input(&settings, &input)?;
            loaded.rendered.write_to(&output)?;
            info!("wrote {} ({} pages)", output.display(), loaded.rendered.page_count);
            for entry in &loaded.rendered.toc {
                println!("{:>4}  {}", entry.page, entry.title);
            }
        }
        Commands::Publish { input } => {
            let loaded = render_input(&settings, &input)?;
            let sink = sink_from_settings(&settings.storage);
            let artifact = sink.publish(&loaded.request, &loaded.rendered.bytes)?;
            println!("{}", serde_json::to_string_pretty(&artifact)?);
        }
        Commands::Delete { id } => {
            let sink = sink_from_settings(&settings.storage);
            let artifact = sink.delete(id)?;
            println!("deleted {} ({}/{})", artifact.id, artifact.bucket, artifact.file_path);
        }
        Commands::List { report_id } => {
            let sink = sink_from_settings(&settings.storage);
            for artifact in sink.list_for_report(&report_id)? {
                println!(
                    "{}  {}  rev {}  {} bytes  {}/{}",
                    artifact.id,
                    artifact.generated_at.format("%Y-%m-%d %H:%M:%S"),
                    artifact.revision,
                    artifact.file_size,
                    artifact.bucket,
                    artifact.file_path
                );
            }
        }
        Commands::Cable { input } => {
            check_schedule(&settings, &input)?;
        }
        Commands::SizeCable {
            load,
            length,
            voltage,
            phase,
            limit,
            derating,
        } => {
            let circuit = Circuit {
                load_current_a: load,
                length_m: length,
                voltage_v: voltage,
                phase: phase.into(),
            };
            let limit = limit.unwrap_or(settings.cable.max_voltage_drop_percent);
            let factors = DeratingFactors {
                grouping: derating,
                ..DeratingFactors::default()
            };
            if !circuit.is_valid() {
                return Err("voltage and length must be positive and the load non-negative".into());
            }
            match costdoc::cable::recommend_size(&circuit, limit, &factors) {
                Some(conductor) => println!(
                    "{} mm² (rating {:.1} A, voltage drop {:.2}%)",
                    conductor.size_mm2,
                    costdoc::cable::derated_rating(conductor, &factors),
                    circuit.drop_percent(conductor).unwrap_or_default()
                ),
                None => return Err(format!("no conductor carries {load} A within {limit}% drop").into()),
            }
        }
    }
    Ok(())
}

fn render_input(settings: &Settings, input: &InputArgs) -> CliResult<Loaded> {
    let renderer = ReportRenderer::new(settings.layout.clone());
    let now = Utc::now();

    match input.kind {
        KindArg::Cost => {
            let report = CostReport::from_json_file(&input.input)?;
            let document = CostReportDocument::new(&report, settings.company.clone())?;
            let rendered = render(&renderer, &document)?;
            let request = PublishRequest {
                kind: ReportKind::CostReport,
                report_id: report.id.clone(),
                project_id: report.project.id.clone(),
                revision: report.revision_label().to_string(),
                file_name: artifact_file_name(
                    ReportKind::CostReport,
                    report.report_number,
                    report.revision_label(),
                    now,
                ),
            };
            Ok(Loaded { rendered, request })
        }
        KindArg::Cable => {
            let schedule = CableSchedule::from_json_file(&input.input)?;
            let document = CableScheduleDocument::new(
                &schedule,
                settings.company.clone(),
                settings.cable.max_voltage_drop_percent,
            );
            let rendered = render(&renderer, &document)?;
            let request = PublishRequest {
                kind: ReportKind::CableSchedule,
                report_id: schedule.id.clone(),
                project_id: schedule.project.id.clone(),
                revision: schedule.revision_label().to_string(),
                file_name: artifact_file_name(
                    ReportKind::CableSchedule,
                    schedule.schedule_number,
                    schedule.revision_label(),
                    now,
                ),
            };
            Ok(Loaded { rendered, request })
        }
    }
}

#[cfg(feature = "bookmarks")]
fn render(renderer: &ReportRenderer, document: &dyn DocumentSource) -> CliResult<RenderedReport> {
    Ok(renderer.render(document)?.with_bookmarks()?)
}

#[cfg(not(feature = "bookmarks"))]
fn render(renderer: &ReportRenderer, document: &dyn DocumentSource) -> CliResult<RenderedReport> {
    Ok(renderer.render(document)?)
}

fn check_schedule(settings: &Settings, path: &Path) -> CliResult<()> {
    let limit = settings.cable.max_voltage_drop_percent;
    let schedule = CableSchedule::from_json_file(path)?;
    let document = CableScheduleDocument::new(&schedule, settings.company.clone(), limit);
    let summary = document.summary();

    for (cable, assessment) in schedule.cables.iter().zip(&summary.assessments) {
        println!(
            "{:<10} {:>6} mm²  {:>7.1} m  {:>6.1} A / {:>6.1} A  {:>5.2}%  {}",
            cable.tag,
            cable.size_mm2,
            cable.length_m,
            cable.load_current_a,
            assessment.derated_rating_a,
            assessment.voltage_drop_percent,
            assessment.compliance.label()
        );
    }
    println!(
        "{} cables, {:.1} m, {} non-compliant",
        summary.cable_count,
        summary.total_length_m,
        summary.non_compliant.len()
    );
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
