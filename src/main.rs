use std::fs::{self, File};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing_subscriber::EnvFilter;

use dewchart::config::{self, ChartConfig, DEFAULT_CONFIG_PATH};
use dewchart::report::{self, ChartRequest, View};
use dewchart::series::{self, WeatherReport};
use dewchart::{Coordinates, data, fetch};

const APP_ABOUT: &str = "dewchart - temperature and dew point forecast charts from api.weather.gov";
const DEFAULT_OUTPUT_HTML: &str = "dist/index.html";
const DEFAULT_OUTPUT_CSV: &str = "dist/forecast.csv";
const CSV_ARCHIVE_EXTENSION: &str = "gz";
const FETCH_MAX_RETRIES: u32 = 5;
const FETCH_DELAY_SECS: u64 = 2;

#[derive(Parser, Debug)]
#[command(name = "dewchart", version, about = APP_ABOUT)]
struct Cli {
    /// Gzip written CSV files to .csv.gz and remove the plain CSV.
    #[arg(long = "archive-csv", global = true)]
    archive_csv: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Hourly labels for one day or daily extrema for the week.
    #[arg(long, value_name = "VIEW", default_value_t = View::Day)]
    view: View,
    /// Where to save the HTML page.
    #[arg(
        short = 'o',
        long = "output-html",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_HTML
    )]
    output_html: PathBuf,
    /// Do not minify the HTML (minified by default).
    #[arg(
        long = "no-minify-html",
        default_value_t = true,
        action = ArgAction::SetFalse
    )]
    minify_html: bool,
    /// TOML file with chart settings.
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Reference instant for the chart window (RFC 3339, defaults to now).
    #[arg(long, value_name = "TIME")]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the forecast for LAT,LON and render the HTML chart.
    Chart {
        /// Coordinates as LAT,LON with four decimals, e.g. 40.7128,-74.0060.
        #[arg(value_name = "LAT,LON", allow_hyphen_values = true)]
        coordinates: Coordinates,
        /// Also keep the raw grid JSON for a later `render`.
        #[arg(long = "save-grid", value_name = "PATH")]
        save_grid: Option<PathBuf>,
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// Render the HTML chart from a saved grid JSON file.
    Render {
        /// Grid data JSON as returned by the forecastGridData endpoint.
        #[arg(short = 'g', long = "grid", value_name = "PATH")]
        grid: PathBuf,
        /// Coordinates used for night shading.
        #[arg(value_name = "LAT,LON", allow_hyphen_values = true)]
        coordinates: Coordinates,
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// Write the parsed temperature and dew point series to CSV.
    Export {
        /// Coordinates to fetch; ignored when --grid is given.
        #[arg(
            value_name = "LAT,LON",
            allow_hyphen_values = true,
            required_unless_present = "grid"
        )]
        coordinates: Option<Coordinates>,
        /// Read a saved grid JSON instead of fetching.
        #[arg(short = 'g', long = "grid", value_name = "PATH")]
        grid: Option<PathBuf>,
        /// Where to save the CSV.
        #[arg(
            short = 'o',
            long = "output-csv",
            value_name = "PATH",
            default_value = DEFAULT_OUTPUT_CSV
        )]
        output_csv: PathBuf,
        /// TOML file with chart settings.
        #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Generate shell completion files.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
        /// Where to save the file (stdout when omitted).
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dewchart=info"));
    let ansi = std::io::stdout().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .compact()
        .init();
}

fn headline(message: &str) {
    tracing::info!(status = "start", "{message}");
}

fn info(message: &str) {
    tracing::info!(status = "info", "{message}");
}

fn success(message: &str) {
    tracing::info!(status = "ok", "{message}");
}

fn error(message: &str) {
    tracing::error!(status = "err", "{message}");
}

fn generate_completions(shell: Shell, output: Option<PathBuf>) -> Result<(), String> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    if let Some(path) = output {
        create_parent_dir(&path)?;
        let mut file = File::create(&path)
            .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
        generate(shell, &mut cmd, bin_name, &mut file);
    } else {
        let mut stdout = std::io::stdout();
        generate(shell, &mut cmd, bin_name, &mut stdout);
    }
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
    }
    Ok(())
}

async fn download_grid(coordinates: Coordinates) -> Result<Vec<u8>, String> {
    let client =
        fetch::build_client().map_err(|err| format!("Failed to build HTTP client: {err}"))?;
    info(&format!("Fetching forecast for {coordinates}"));
    let body = fetch::get_grid_data(
        &client,
        coordinates,
        FETCH_MAX_RETRIES,
        Duration::from_secs(FETCH_DELAY_SECS),
    )
    .await
    .map_err(|err| format!("Failed to fetch forecast for {coordinates}: {err}"))?;
    Ok(body.to_vec())
}

fn read_grid(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|err| format!("Failed to read grid data {}: {err}", path.display()))
}

fn save_grid(body: &[u8], path: &Path) -> Result<(), String> {
    create_parent_dir(path)?;
    fs::write(path, body)
        .map_err(|err| format!("Failed to write grid data {}: {err}", path.display()))?;
    success(&format!("Saved grid data to {}", path.display()));
    Ok(())
}

fn parse_report(body: &[u8], config: &ChartConfig) -> Result<WeatherReport, String> {
    let report = series::parse_grid_data(body, config.parse)
        .map_err(|err| format!("Failed to parse grid data: {err}"))?;
    tracing::info!(
        temperature_points = report.temperature.points.len(),
        dew_point_points = report.dew_point.points.len(),
        expand_durations = config.parse.expand_duration_to_hourly_points,
        "Parsed grid data"
    );
    Ok(report)
}

fn render_chart(
    body: &[u8],
    coordinates: Coordinates,
    args: &ChartArgs,
    config: &ChartConfig,
) -> Result<(), String> {
    let report = parse_report(body, config)?;
    let request = ChartRequest {
        report: &report,
        coordinates,
        view: args.view,
        now: args.now.unwrap_or_else(Utc::now),
        config,
    };
    report::draw_weather_chart(&request, &args.output_html, args.minify_html)
        .map_err(|err| format!("Failed to render chart: {err}"))?;
    success(&format!("Saved HTML to {}", args.output_html.display()));
    Ok(())
}

fn file_name_for(path: &Path) -> Result<String, String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| format!("Path {} has no file name", path.display()))
}

fn archive_path_for(csv_path: &Path) -> Result<PathBuf, String> {
    let file_name = file_name_for(csv_path)?;
    let mut archive_path = csv_path.to_path_buf();
    archive_path.set_file_name(format!("{file_name}.{CSV_ARCHIVE_EXTENSION}"));
    Ok(archive_path)
}

fn archive_csv_file(csv_path: &Path) -> Result<PathBuf, String> {
    let archive_path = archive_path_for(csv_path)?;
    create_parent_dir(&archive_path)?;
    let mut input = File::open(csv_path)
        .map_err(|err| format!("Failed to open CSV {}: {err}", csv_path.display()))?;
    let output = File::create(&archive_path)
        .map_err(|err| format!("Failed to create archive {}: {err}", archive_path.display()))?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    std::io::copy(&mut input, &mut encoder)
        .map_err(|err| format!("Failed to write archive {}: {err}", archive_path.display()))?;
    encoder.finish().map_err(|err| {
        format!(
            "Failed to finalize archive {}: {err}",
            archive_path.display()
        )
    })?;
    fs::remove_file(csv_path)
        .map_err(|err| format!("Failed to remove CSV {}: {err}", csv_path.display()))?;
    Ok(archive_path)
}

async fn run_chart(
    coordinates: Coordinates,
    save_grid_path: Option<PathBuf>,
    args: ChartArgs,
) -> Result<(), String> {
    let config = config::load_config(&args.config)?;
    tracing::info!(
        mode = "chart",
        %coordinates,
        view = %args.view,
        zone = %config.zone,
        output_html = %args.output_html.display(),
        minify_html = args.minify_html,
        "Starting chart pipeline"
    );
    let body = download_grid(coordinates).await?;
    if let Some(path) = save_grid_path {
        save_grid(&body, &path)?;
    }
    render_chart(&body, coordinates, &args, &config)
}

fn run_render(grid: &Path, coordinates: Coordinates, args: &ChartArgs) -> Result<(), String> {
    let config = config::load_config(&args.config)?;
    tracing::info!(
        mode = "render",
        %coordinates,
        view = %args.view,
        grid = %grid.display(),
        output_html = %args.output_html.display(),
        "Rendering chart from saved grid data"
    );
    let body = read_grid(grid)?;
    render_chart(&body, coordinates, args, &config)
}

async fn run_export(
    coordinates: Option<Coordinates>,
    grid: Option<PathBuf>,
    output_csv: &Path,
    config_path: &Path,
    archive_csv: bool,
) -> Result<(), String> {
    let config = config::load_config(config_path)?;
    tracing::info!(
        mode = "export",
        archive_csv,
        output_csv = %output_csv.display(),
        "Exporting forecast series"
    );
    let body = match (grid, coordinates) {
        (Some(path), _) => read_grid(&path)?,
        (None, Some(coordinates)) => download_grid(coordinates).await?,
        (None, None) => return Err("Either LAT,LON or --grid is required".to_string()),
    };
    let report = parse_report(&body, &config)?;
    data::to_csv(&report, config.zone, output_csv)?;
    if archive_csv {
        let archive = archive_csv_file(output_csv)?;
        success(&format!("Saved archive to {}", archive.display()));
    } else {
        success(&format!("Saved CSV to {}", output_csv.display()));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let archive_csv = cli.archive_csv;

    let result = match cli.command {
        Command::Completions { shell, output } => {
            return match generate_completions(shell, output) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("{err}");
                    ExitCode::FAILURE
                }
            };
        }
        Command::Chart {
            coordinates,
            save_grid,
            chart,
        } => {
            init_logging();
            headline(APP_ABOUT);
            run_chart(coordinates, save_grid, chart).await
        }
        Command::Render {
            grid,
            coordinates,
            chart,
        } => {
            init_logging();
            headline(APP_ABOUT);
            run_render(&grid, coordinates, &chart)
        }
        Command::Export {
            coordinates,
            grid,
            output_csv,
            config,
        } => {
            init_logging();
            headline(APP_ABOUT);
            run_export(coordinates, grid, &output_csv, &config, archive_csv).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error(&err);
            ExitCode::FAILURE
        }
    }
}
