use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use formats::RegionDataset;
use gemeente_viewer::{MemoryUi, Viewer, ViewerConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Client;
use runtime::Locator;
use tools::announce::DEFAULT_BASE_URL;
use tools::schedule::{codes_from_maps_dir, end_of_next_year};
use tools::{Announcement, Schedule, render};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Daily gemeente tooling")]
struct Args {
    /// Region dataset (GeoJSON FeatureCollection, EPSG:4326)
    #[arg(long, env = "GEMEENTE_DATASET", default_value = "data/gemeenten-simple-4326.json")]
    dataset: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List region codes, names and provinces sorted by name
    List,

    /// Run the viewer headless for a locator and print what the page would show
    Resolve {
        /// URL fragment, e.g. "#gmcode=GM0344"
        locator: String,

        #[arg(long, default_value_t = 1280)]
        width: u32,

        #[arg(long, default_value_t = 720)]
        height: u32,
    },

    /// Assign one region per day until the end of next year
    Schedule {
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Take codes from the rendered maps in this directory instead of the dataset
        #[arg(long)]
        maps_dir: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,

        /// Output file, stdout if absent
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the announcement for a scheduled day
    Message {
        #[arg(long, default_value = "schedule.json")]
        schedule: PathBuf,

        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, env = "GEMEENTE_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        #[arg(long, env = "GEMEENTE_MAPS_DIR", default_value = "../atlas/maps")]
        maps_dir: PathBuf,
    },

    /// Render a region map to `<out>/<code>.png`
    Render {
        code: String,

        #[arg(long, env = "GEMEENTE_MAPS_DIR", default_value = "../atlas/maps")]
        out: PathBuf,

        #[arg(long, default_value_t = 1200)]
        width: u32,

        #[arg(long, default_value_t = 1200)]
        height: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<(), String> {
    match args.command {
        Command::List => cmd_list(&load_dataset(&args.dataset)?),
        Command::Resolve {
            locator,
            width,
            height,
        } => cmd_resolve(load_dataset(&args.dataset)?, &locator, [width, height]),
        Command::Schedule {
            start,
            maps_dir,
            seed,
            out,
        } => {
            let codes = match maps_dir {
                Some(dir) => codes_from_maps_dir(dir).map_err(|e| e.to_string())?,
                None => load_dataset(&args.dataset)?
                    .codes()
                    .map(str::to_string)
                    .collect(),
            };
            cmd_schedule(&codes, start.unwrap_or_else(today), seed, out)
        }
        Command::Message {
            schedule,
            date,
            base_url,
            maps_dir,
        } => cmd_message(&schedule, date.unwrap_or_else(today), &base_url, maps_dir),
        Command::Render {
            code,
            out,
            width,
            height,
        } => cmd_render(load_dataset(&args.dataset)?, &code, out, [width, height]).await,
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn load_dataset(path: &Path) -> Result<RegionDataset, String> {
    let dataset = RegionDataset::from_path(path).map_err(|e| format!("{}: {e}", path.display()))?;
    info!(path = %path.display(), regions = dataset.len(), "dataset loaded");
    Ok(dataset)
}

fn cmd_list(dataset: &RegionDataset) -> Result<(), String> {
    for record in dataset.sorted_by_name() {
        println!("{}\t{}\t{}", record.code, record.name, record.province);
    }
    Ok(())
}

fn cmd_resolve(dataset: RegionDataset, locator: &str, size: [u32; 2]) -> Result<(), String> {
    let mut ui = MemoryUi::new(size);
    let mut viewer = Viewer::new(ViewerConfig::default(), Arc::new(dataset), size);
    let outcome = viewer.navigate(Locator::new(locator), &mut ui);

    println!("locator\t{}", viewer.locator());
    match outcome {
        Ok(()) => {
            let view = viewer.view();
            println!("title\t{}", ui.title);
            println!("center\t{:.3},{:.3}", view.center[0], view.center[1]);
            println!("resolution\t{:.4}", view.resolution);
        }
        Err(reason) => {
            println!("status\t{}", reason.reason());
            println!("message\t{}", ui.error_message);
            if let Some(options) = &ui.search_options {
                println!("search\t{} options", options.len());
            }
        }
    }
    Ok(())
}

fn cmd_schedule(
    codes: &[String],
    start: NaiveDate,
    seed: Option<u64>,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let end = end_of_next_year(start).ok_or_else(|| format!("no end date after {start}"))?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let schedule = Schedule::generate(codes, start, end, &mut rng).map_err(|e| e.to_string())?;
    let json = schedule.to_json_pretty().map_err(|e| e.to_string())?;

    match out {
        Some(path) => {
            std::fs::write(&path, json).map_err(|e| format!("write {}: {e}", path.display()))?;
            info!(path = %path.display(), days = schedule.len(), "schedule written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_message(
    schedule: &Path,
    date: NaiveDate,
    base_url: &str,
    maps_dir: PathBuf,
) -> Result<(), String> {
    let schedule = Schedule::load(schedule).map_err(|e| e.to_string())?;
    let code = schedule.code_for(date).map_err(|e| e.to_string())?;
    let announcement = Announcement::for_code(code, base_url, maps_dir);
    if !announcement.image_path.is_file() {
        tracing::warn!(path = %announcement.image_path.display(), "map image missing");
    }
    println!("{}", announcement.message);
    println!("{}", announcement.image_path.display());
    Ok(())
}

async fn cmd_render(
    dataset: RegionDataset,
    code: &str,
    out: PathBuf,
    size: [u32; 2],
) -> Result<(), String> {
    std::fs::create_dir_all(&out).map_err(|e| format!("create {}: {e}", out.display()))?;
    let client = Client::new();
    let surface =
        render::render_region(&client, ViewerConfig::default(), Arc::new(dataset), code, size)
            .await
            .map_err(|e| e.to_string())?;
    let path = out.join(format!("{code}.png"));
    render::save_png(surface, &path).map_err(|e| e.to_string())?;
    println!("{}", path.display());
    Ok(())
}
