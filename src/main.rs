//! CLI entry point for the commute choropleth.
//!
//! Provides subcommands for rendering the map, bar chart and legend to SVG,
//! exporting per-community summaries, and listing the recognised modes.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use commute_map::{
    color::Colorizer,
    config::MapConfig,
    fetch::BasicClient,
    loader::load_atlas,
    modes::TravelMode,
    output::{dataset_summary, print_json, write_json, write_summary_csv},
    render::render,
    selection::{AppState, Message, ZoomTransform},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "commute_map")]
#[command(about = "Choropleth of commuting modes per community", long_about = None)]
struct Cli {
    /// JSON file overriding palettes, layout and count parsing
    #[arg(long, global = true, env = "COMMUTE_MAP_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Sources {
    /// GeoJSON community boundaries (path or URL)
    #[arg(
        long,
        env = "COMMUTE_MAP_BOUNDARIES",
        default_value = "data/geoJson/Community_Boundaries.geojson"
    )]
    boundaries: String,

    /// Mode-of-travel CSV (path or URL)
    #[arg(long, env = "COMMUTE_MAP_TABLE", default_value = "data/Modes_of_Travel.csv")]
    table: String,

    /// Mode of travel, by column name or label (e.g. "walk", "Drive alone")
    #[arg(short, long, default_value = "bicycle")]
    mode: TravelMode,
}

#[derive(Subcommand)]
enum Commands {
    /// Render map, legend and bar chart to an SVG file
    Render {
        #[command(flatten)]
        sources: Sources,

        /// Community codes to click, in order (repeat to select several)
        #[arg(short, long = "select", value_name = "COMM_CODE")]
        select: Vec<String>,

        /// Community code under the cursor
        #[arg(long, value_name = "COMM_CODE")]
        hover: Option<String>,

        /// Map zoom factor, clamped to 1..=8
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,

        /// Map pan offset in pixels
        #[arg(
            long,
            num_args = 2,
            value_names = ["X", "Y"],
            allow_negative_numbers = true,
            default_values_t = [0.0, 0.0]
        )]
        pan: Vec<f64>,

        /// SVG file to write
        #[arg(short, long, default_value = "map.svg")]
        output: String,
    },
    /// Export each community's share, bucket and colour
    Summary {
        #[command(flatten)]
        sources: Sources,

        /// CSV file to write
        #[arg(short, long, default_value = "summary.csv")]
        output: String,

        /// Optional JSON file with totals and join report
        #[arg(long)]
        json: Option<String>,
    },
    /// List recognised modes of travel
    Modes,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/commute_map.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("commute_map.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    let colorizer = config.colorizer();

    match cli.command {
        Commands::Render {
            sources,
            select,
            hover,
            zoom,
            pan,
            output,
        } => {
            let client = BasicClient::new()?;
            let atlas = load_atlas(
                &client,
                &sources.boundaries,
                &sources.table,
                config.count_policy,
            )
            .await?;

            let (x, y) = match pan.as_slice() {
                [x, y] => (*x, *y),
                _ => (0.0, 0.0),
            };
            let mut state = AppState::default();
            let messages = std::iter::once(Message::ChangeMode(sources.mode))
                .chain(select.into_iter().map(Message::Click))
                .chain(hover.into_iter().map(Message::MouseEnter))
                .chain(std::iter::once(Message::Zoom(ZoomTransform::new(zoom, x, y))));
            for msg in messages {
                state.update(msg, &colorizer)?;
            }

            for code in state.selection.selected() {
                if atlas.boundaries().iter().all(|b| b.comm_code != code) {
                    warn!(comm_code = code, "Selected community is not on the map");
                }
            }

            let scene = render(&atlas, &state, &colorizer, &config.layout);
            std::fs::write(&output, scene.to_svg())
                .with_context(|| format!("failed to write '{output}'"))?;

            info!(
                output,
                mode = %state.mode,
                zoom = %state.zoom,
                shapes = scene.shapes.len(),
                bars = scene.plot.bars.len(),
                "SVG written"
            );
        }
        Commands::Summary {
            sources,
            output,
            json,
        } => {
            if !colorizer.has_palette(sources.mode) {
                warn!(mode = %sources.mode, "No palette for mode, every community gets the no-data colour");
            }

            let client = BasicClient::new()?;
            let atlas = load_atlas(
                &client,
                &sources.boundaries,
                &sources.table,
                config.count_policy,
            )
            .await?;

            let summary = dataset_summary(&atlas, sources.mode, &colorizer);
            write_summary_csv(&output, &summary.communities)
                .with_context(|| format!("failed to write '{output}'"))?;

            match json {
                Some(path) => write_json(&path, &summary)
                    .with_context(|| format!("failed to write '{path}'"))?,
                None => print_json(&summary.totals)?,
            }

            info!(output, rows = summary.communities.len(), "Summary written");
        }
        Commands::Modes => list_modes(&colorizer),
    }

    Ok(())
}

fn list_modes(colorizer: &Colorizer) {
    for mode in TravelMode::ALL {
        info!(
            column = mode.column(),
            label = mode.label().unwrap_or("-"),
            mappable = colorizer.has_palette(mode),
            "Mode"
        );
    }
}
