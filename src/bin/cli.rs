//! heatcluster CLI - driver and debug tool for the heatmap pipeline
//!
//! Usage:
//!   heatcluster-cli heatmap <pings.json> [--lat <lat> --long <long>] [--api-key <key>]
//!   heatcluster-cli clusters <pings.json> [--eps <eps>] [--min-pts <n>]
//!   heatcluster-cli generate <out.json> [--hotspots <n>] [--seed <seed>]
//!
//! Ping files hold `[latitude, longitude, unix_seconds]` triples.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use heatcluster::{
    dbscan, parse_origin, partition_by_age, store::write_pings, summarize_clusters,
    synthetic::PingScenario, Coordinate, GeoPointStore, HeatmapConfig, HeatmapPipeline,
    HeatmapResponse, JsonFileStore, Result, TimeWindow, UnavailableProvider,
};

#[derive(Parser)]
#[command(name = "heatcluster-cli")]
#[command(about = "Cluster geolocation pings into a locality-grouped heatmap", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct ClusterArgs {
    /// JSON configuration file (fields default when missing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override DBSCAN neighborhood radius (degrees)
    #[arg(long)]
    eps: Option<f64>,

    /// Override DBSCAN minimum neighborhood size
    #[arg(long)]
    min_pts: Option<usize>,

    /// Query time as unix seconds (defaults to the current time)
    #[arg(long)]
    now: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full heatmap response and print it as JSON
    Heatmap {
        /// Ping file
        pings: PathBuf,

        /// Origin latitude (requires --long)
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,

        /// Origin longitude (requires --lat)
        #[arg(long, allow_hyphen_values = true)]
        long: Option<String>,

        /// Google Maps API key (requires the `http` feature; offline without it)
        #[arg(long, env = "HEATCLUSTER_MAPS_API_KEY")]
        api_key: Option<String>,

        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        cluster: ClusterArgs,
    },

    /// Print clusters per time window without resolving localities
    Clusters {
        /// Ping file
        pings: PathBuf,

        #[command(flatten)]
        cluster: ClusterArgs,
    },

    /// Write a synthetic ping file
    Generate {
        /// Output file
        output: PathBuf,

        /// Number of hotspots
        #[arg(long, default_value = "3")]
        hotspots: usize,

        /// Pings per hotspot
        #[arg(long, default_value = "25")]
        points_per_hotspot: usize,

        /// Scattered background pings
        #[arg(long, default_value = "10")]
        background: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Query time the timestamps are relative to (defaults to the current time)
        #[arg(long)]
        now: Option<i64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Heatmap {
            pings,
            lat,
            long,
            api_key,
            pretty,
            cluster,
        } => run_heatmap(
            &pings,
            lat.as_deref(),
            long.as_deref(),
            api_key,
            pretty,
            &cluster,
        ),
        Commands::Clusters { pings, cluster } => run_clusters(&pings, &cluster),
        Commands::Generate {
            output,
            hotspots,
            points_per_hotspot,
            background,
            seed,
            now,
        } => run_generate(&output, hotspots, points_per_hotspot, background, seed, now),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn current_unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn load_config(args: &ClusterArgs) -> Result<HeatmapConfig> {
    let mut config = match &args.config {
        Some(path) => HeatmapConfig::from_json_file(path)?,
        None => HeatmapConfig::default(),
    };
    if let Some(eps) = args.eps {
        config.eps = eps;
    }
    if let Some(min_pts) = args.min_pts {
        config.min_pts = min_pts;
    }
    config.validate()?;
    Ok(config)
}

fn run_heatmap(
    pings: &Path,
    lat: Option<&str>,
    long: Option<&str>,
    api_key: Option<String>,
    pretty: bool,
    args: &ClusterArgs,
) -> Result<()> {
    let origin = parse_origin(lat, long)?;
    let config = load_config(args)?;
    let now = args.now.unwrap_or_else(current_unix_time);
    let store = JsonFileStore::new(pings);

    #[cfg(feature = "http")]
    {
        if let Some(key) = api_key {
            let client = heatcluster::GoogleMapsClient::new(key, config.request_timeout())?;
            let pipeline = HeatmapPipeline::new(store, client.clone(), client, config)?;
            let response = pipeline.run(now, origin)?;
            return print_response(&response, pretty);
        }
    }

    #[cfg(not(feature = "http"))]
    {
        if api_key.is_some() {
            log::warn!("built without the `http` feature; ignoring --api-key");
        }
    }

    log::info!("resolving localities offline (every cluster lands in the \"\" bucket)");
    let pipeline = HeatmapPipeline::new(store, UnavailableProvider, UnavailableProvider, config)?;
    let response = pipeline.run(now, origin)?;
    print_response(&response, pretty)
}

fn print_response(response: &HeatmapResponse, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    }
    .map_err(heatcluster::HeatmapError::store)?;
    println!("{}", json);
    Ok(())
}

fn run_clusters(pings: &Path, args: &ClusterArgs) -> Result<()> {
    let config = load_config(args)?;
    let now = args.now.unwrap_or_else(current_unix_time);
    let points = JsonFileStore::new(pings).fetch_all()?;
    let partitions = partition_by_age(&points, now, config.prediction_lag_secs);

    println!("\n{}", "=".repeat(60));
    println!(
        "{} pings (eps={}, min_pts={}, now={})",
        points.len(),
        config.eps,
        config.min_pts,
        now
    );
    println!("{}", "=".repeat(60));

    for window in [TimeWindow::Current, TimeWindow::Predicted] {
        let window_points = partitions.window(window);
        let clustering = dbscan(window_points, &config.dbscan())?;
        let summaries = summarize_clusters(window_points, &clustering);

        println!(
            "\n[{}] {} pings -> {} clusters, {} noise",
            window,
            window_points.len(),
            clustering.len(),
            clustering.noise.len()
        );
        for (cluster, summary) in clustering.clusters.iter().zip(&summaries) {
            let Coordinate {
                latitude,
                longitude,
            } = summary.centroid;
            println!(
                "  #{:<3} seed={:<5} pax={:<5} centroid=({:.5}, {:.5})",
                cluster.id, cluster.seed, summary.pax_count, latitude, longitude
            );
        }
    }
    Ok(())
}

fn run_generate(
    output: &Path,
    hotspots: usize,
    points_per_hotspot: usize,
    background: usize,
    seed: u64,
    now: Option<i64>,
) -> Result<()> {
    // Hotspots spaced well beyond the default eps so they stay separate
    let centers = (0..hotspots)
        .map(|i| Coordinate::new(-6.2 + (i / 4) as f64 * 5.0, 106.8 + (i % 4) as f64 * 5.0))
        .collect();

    let scenario = PingScenario {
        centers,
        points_per_center: points_per_hotspot,
        background_points: background,
        now: now.unwrap_or_else(current_unix_time),
        seed,
        ..PingScenario::default()
    };

    let pings = scenario.generate();
    write_pings(output, &pings)?;
    log::info!("wrote {} pings to {}", pings.len(), output.display());
    Ok(())
}
