use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use hazard_watch::config::Settings;
use hazard_watch::map::MapLayers;
use hazard_watch::models::{HazardType, IncidentId, Position, Severity};
use hazard_watch::moderation::{Decision, ModerationQueue, StatusFilter};
use hazard_watch::report_flow::ReportFlow;
use hazard_watch::route::RouteFlow;
use hazard_watch::selection::Selection;
use hazard_watch::service::{LocalIncidentService, MockRoutePlanner};
use hazard_watch::store::{IncidentFilter, IncidentStore};
use hazard_watch::{analytics, export, ingest, map, moderation, report, risk, snapshot};

#[derive(Parser)]
#[command(name = "hazard-watch")]
#[command(about = "Road hazard reports, moderation and safe routing", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the demo incidents
    Seed,
    /// Import detections from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show the moderation queue
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Count incidents by status
    Stats,
    /// Approve a pending incident
    Approve { id: String },
    /// Reject a pending incident
    Reject { id: String },
    /// Print the map markers as JSON
    Markers {
        #[arg(long)]
        hide_anomalies: bool,
        /// Selected map position as LAT,LON
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        select: Option<Position>,
    },
    /// Submit a hazard report
    Report {
        #[arg(long = "type")]
        hazard_type: Option<HazardType>,
        #[arg(long)]
        severity: Option<Severity>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Plan an emergency route
    Route {
        #[arg(long, default_value = "")]
        from: String,
        #[arg(long, default_value = "")]
        to: String,
        /// Index of the route to use
        #[arg(long)]
        choose: Option<usize>,
    },
    /// Print chart data as JSON
    Analytics {
        #[arg(
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(i64).range(1..=risk::MAX_LOOKBACK_DAYS)
        )]
        days: i64,
    },
    /// Write a markdown summary
    Summary {
        #[arg(long)]
        area: Option<String>,
        #[arg(
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(i64).range(1..=risk::MAX_LOOKBACK_DAYS)
        )]
        days: i64,
        #[arg(long, default_value = "summary.md")]
        out: PathBuf,
    },
    /// Export incidents to CSV
    Export {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let settings = cli.settings;
    let mut store = snapshot::load(&settings.store)?;
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Seed => {
            let added = ingest::seed(&mut store)?;
            snapshot::save(&store, &settings.store)?;
            println!("Seeded {added} incidents.");
        }
        Commands::Import { csv } => {
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let result = ingest::import_csv(&mut store, file);
            snapshot::save(&store, &settings.store)?;
            let inserted = result?;
            println!("Imported {inserted} detections from {}.", csv.display());
        }
        Commands::List { search, status } => {
            let queue = ModerationQueue::new(search, status);
            let rows = queue.rows(&store);

            if rows.is_empty() {
                println!("No reports match this filter.");
                return Ok(());
            }

            for row in rows {
                let incident = &row.incident;
                println!(
                    "- {} {} [{} {}] {} at {} by {}{}{}",
                    incident.id,
                    incident.hazard_type,
                    incident.severity,
                    row.bucket,
                    incident.status,
                    incident.area_label(),
                    incident.reporter,
                    if incident.has_photo { " (photo)" } else { "" },
                    if row.actionable { " - awaiting review" } else { "" },
                );
            }
        }
        Commands::Stats => {
            let stats = moderation::stats(&store);
            println!(
                "Total {} | Pending {} | Approved {} | Rejected {}",
                stats.total, stats.pending, stats.approved, stats.rejected
            );
        }
        Commands::Approve { id } => {
            moderate(&mut store, &settings, IncidentId::from(id), Decision::Approve)?;
        }
        Commands::Reject { id } => {
            moderate(&mut store, &settings, IncidentId::from(id), Decision::Reject)?;
        }
        Commands::Markers {
            hide_anomalies,
            select,
        } => {
            let mut selection = Selection::new();
            if let Some(position) = select {
                map::handle_click(&mut selection, position.lat, position.lon);
            }
            let layers = MapLayers {
                show_anomalies: !hide_anomalies,
            };
            let markers = map::sync_markers(&store, layers, &selection);
            println!("{}", serde_json::to_string_pretty(&markers)?);
        }
        Commands::Report {
            hazard_type,
            severity,
            description,
            lat,
            lon,
            photo,
        } => {
            let mut selection = Selection::new();
            if let (Some(lat), Some(lon)) = (lat, lon) {
                map::handle_click(&mut selection, lat, lon);
            }

            let mut flow = ReportFlow::new(settings.reporter.clone());
            if let Some(hazard_type) = hazard_type {
                flow.set_type(hazard_type);
            }
            if let Some(severity) = severity {
                flow.set_severity(severity);
            }
            flow.set_description(description);
            if let Some(photo) = photo {
                let name = photo
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| photo.display().to_string());
                flow.attach_photo(name, guess_mime(&photo))?;
            }

            let mut service = LocalIncidentService::new(&mut store, settings.latency());
            let outcome = flow
                .submit(&mut service, &mut selection, settings.timeout())
                .await
                .context("report was not submitted")?;

            match outcome {
                Some(incident) => {
                    snapshot::save(&store, &settings.store)?;
                    println!(
                        "Report submitted as {} ({} {}).",
                        incident.id, incident.severity, incident.hazard_type
                    );
                }
                None => println!("Report was already submitted."),
            }
        }
        Commands::Route { from, to, choose } => {
            let planner = MockRoutePlanner::new(settings.latency());
            let mut flow = RouteFlow::new();
            flow.set_start(from);
            flow.set_end(to);

            let routes = flow
                .compute(&planner, settings.timeout())
                .await
                .context("route planning failed")?;

            println!("Route options:");
            for (index, route) in routes.iter().enumerate() {
                println!(
                    "{index}. {} route: {:.1} km, {} min, {} risk",
                    route.kind, route.distance_km, route.duration_minutes, route.risk_tier
                );
            }

            if let Some(choice) = choose {
                println!("{}", flow.select(choice)?);
            }
        }
        Commands::Analytics { days } => {
            let incidents = store.list(&IncidentFilter::default());
            let summary = analytics::compute(&incidents, today, days)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Summary { area, days, out } => {
            let incidents = store.list(&IncidentFilter::default());
            let summary = report::build_report(area.as_deref(), days, today, &incidents)?;
            std::fs::write(&out, summary)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Summary written to {}.", out.display());
        }
        Commands::Export {
            search,
            status,
            out,
        } => {
            let queue = ModerationQueue::new(search, status);
            let incidents = store.list(&queue.filter());
            let out = out.unwrap_or_else(|| PathBuf::from(export::default_file_name(today)));
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_csv(&incidents, file)?;
            println!("Exported {} reports to {}.", incidents.len(), out.display());
        }
    }

    Ok(())
}

fn moderate(
    store: &mut IncidentStore,
    settings: &Settings,
    id: IncidentId,
    decision: Decision,
) -> anyhow::Result<()> {
    let incident = ModerationQueue::default()
        .decide(store, &id, decision)
        .with_context(|| format!("could not moderate {id}"))?;
    snapshot::save(store, &settings.store)?;
    println!("Report {} is now {}.", incident.id, incident.status);
    Ok(())
}

fn parse_position(raw: &str) -> Result<Position, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {raw:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude {lat:?}"))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("bad longitude {lon:?}"))?;
    Ok(Position::new(lat, lon))
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}
