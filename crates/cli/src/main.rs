use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use classifier::CropClassifier;
use data_loader::{FEATURE_ORDER_VERSION, FeatureStatistics};
use explain::rank_features;
use server::{
    CropQuery, EngineConfig, EngineContext, QueryInput, RecommendError,
    RecommendationOrchestrator, RecommendationResult, ValidationError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;
use weather::WeatherClient;

/// Crop Advisor - crop recommendation from soil and weather
#[derive(Parser)]
#[command(name = "crop-advisor")]
#[command(about = "Recommends a crop from soil nutrients, acidity and weather", long_about = None)]
struct Cli {
    /// Classifier artifact (overrides CROP_MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Reference dataset (overrides CROP_DATASET_PATH)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a crop for one field
    #[command(allow_negative_numbers = true)]
    Recommend {
        /// Nitrogen content of the soil
        #[arg(long)]
        nitrogen: f64,

        /// Phosphorus content of the soil
        #[arg(long)]
        phosphorus: f64,

        /// Potassium content of the soil
        #[arg(long)]
        potassium: f64,

        /// Soil pH (0-14)
        #[arg(long, alias = "acidity")]
        ph: f64,

        /// Rainfall in mm
        #[arg(long)]
        rainfall: f64,

        /// Location used for the weather lookup
        #[arg(long, alias = "city")]
        location: String,

        /// Air temperature in °C (required without --live-weather)
        #[arg(long)]
        temperature: Option<f64>,

        /// Relative humidity in % (defaults to the historical mean)
        #[arg(long)]
        humidity: Option<f64>,

        /// Fetch temperature and humidity from the weather provider
        #[arg(long)]
        live_weather: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current weather for a location
    Weather {
        #[arg(long, alias = "city")]
        location: String,
    },

    /// Show historical feature means
    Stats {
        /// Only this feature (e.g. "N", "rainfall", "pH")
        #[arg(long)]
        feature: Option<String>,
    },

    /// Show class labels and ranked feature importances
    Model,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env().context("Invalid configuration")?;
    if let Some(model) = cli.model {
        config = config.with_model_path(model);
    }
    if let Some(dataset) = cli.dataset {
        config = config.with_dataset_path(dataset);
    }
    debug!(
        "Using model {:?} and dataset {:?}",
        config.model_path, config.dataset_path
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            nitrogen,
            phosphorus,
            potassium,
            ph,
            rainfall,
            location,
            temperature,
            humidity,
            live_weather,
            json,
        } => {
            let input = QueryInput {
                nitrogen: Some(nitrogen),
                phosphorus: Some(phosphorus),
                potassium: Some(potassium),
                ph: Some(ph),
                rainfall: Some(rainfall),
                location: Some(location),
                temperature,
                humidity,
            };
            handle_recommend(&config, input, live_weather, json).await?
        }
        Commands::Weather { location } => handle_weather(&config, &location).await?,
        Commands::Stats { feature } => handle_stats(&config, feature.as_deref())?,
        Commands::Model => handle_model(&config)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&config, requests, concurrent).await?,
    }

    Ok(())
}

fn load_orchestrator(config: &EngineConfig) -> Result<RecommendationOrchestrator> {
    let start = Instant::now();
    let orchestrator = RecommendationOrchestrator::new(EngineContext::load(config)?);
    eprintln!(
        "{} Loaded {} crop classes and reference data in {:?}",
        "✓".green(),
        orchestrator.context().classifier.class_labels().len(),
        start.elapsed()
    );
    Ok(orchestrator)
}

/// Handle the 'recommend' command
async fn handle_recommend(
    config: &EngineConfig,
    input: QueryInput,
    live_weather: bool,
    json: bool,
) -> Result<()> {
    let orchestrator = load_orchestrator(config)?;

    match orchestrator.handle(input, live_weather).await {
        Ok(result) if json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Ok(result) => print_recommendation(&result),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Handle the 'weather' command
async fn handle_weather(config: &EngineConfig, location: &str) -> Result<()> {
    let client = WeatherClient::new(config.weather.clone())?;

    match client.fetch(location).await {
        Ok(observation) => {
            println!("{}", format!("Weather in {}", observation.location).bold().blue());
            println!("{}Temperature: {:.1} °C", "• ".green(), observation.temperature);
            println!("{}Humidity: {:.0} %", "• ".green(), observation.humidity);
            println!("{}Conditions: {}", "• ".green(), observation.description);
            Ok(())
        }
        Err(e) => {
            print_error(&RecommendError::from(e));
            std::process::exit(1);
        }
    }
}

/// Handle the 'stats' command
fn handle_stats(config: &EngineConfig, feature: Option<&str>) -> Result<()> {
    let stats = FeatureStatistics::load_from_file(&config.dataset_path)
        .with_context(|| format!("Failed to load reference dataset {:?}", config.dataset_path))?;

    if let Some(name) = feature {
        let mean = stats.mean_of(name)?;
        println!("{}: {:.3}", name, mean);
        return Ok(());
    }

    println!(
        "{}",
        format!("Historical means ({} records)", stats.record_count()).bold().blue()
    );
    for (feature, mean) in stats.iter() {
        println!("{}{:<12} {:>10.3}", "• ".cyan(), feature.display_name(), mean);
    }
    if !stats.labels().is_empty() {
        let labels: Vec<&str> = stats.labels().iter().map(String::as_str).collect();
        println!("Crops: {}", labels.join(", "));
    }
    Ok(())
}

/// Handle the 'model' command
fn handle_model(config: &EngineConfig) -> Result<()> {
    let classifier =
        CropClassifier::load(&config.model_path).context("Failed to load crop classifier")?;

    println!("{}", format!("Model: {}", classifier.source()).bold().blue());
    println!("Feature order version: {}", FEATURE_ORDER_VERSION);
    println!("Classes: {}", classifier.class_labels().join(", "));
    println!("Feature importances:");
    for (rank, (feature, weight)) in rank_features(classifier.feature_importances())
        .into_iter()
        .enumerate()
    {
        println!(
            "  {}. {:<12} {:.3}",
            (rank + 1).to_string().green(),
            feature.display_name(),
            weight
        );
    }
    Ok(())
}

/// Random but valid offline query
fn random_query() -> Result<CropQuery, ValidationError> {
    CropQuery::new(
        rand::random_range(0.0..140.0),
        rand::random_range(5.0..145.0),
        rand::random_range(5.0..205.0),
        rand::random_range(3.5..9.9),
        rand::random_range(20.0..300.0),
        "Benchmark",
    )?
    .with_conditions(
        Some(rand::random_range(8.0..44.0)),
        Some(rand::random_range(14.0..100.0)),
    )
}

/// Handle the 'benchmark' command
async fn handle_benchmark(config: &EngineConfig, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 {
        println!("Nothing to do: --requests is 0");
        return Ok(());
    }
    let queries = (0..requests)
        .map(|_| random_query())
        .collect::<Result<Vec<_>, _>>()?;
    let orchestrator = load_orchestrator(config)?;
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));

    // Use tokio::spawn to make concurrent requests
    let start = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for query in queries {
        let orchestrator = orchestrator.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            orchestrator.recommend(&query, false).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = start.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print a recommendation
fn print_recommendation(result: &RecommendationResult) {
    println!("{}", "Crop Recommendation:".bold().blue());
    println!(
        "{} {} (confidence {:.3})",
        "→".green(),
        result.crop.bold(),
        result.confidence
    );
    println!("{}", result.advisory);

    if !result.top_factors.is_empty() {
        println!("Top factors:");
        for (rank, factor) in result.top_factors.iter().enumerate() {
            println!("  {}. {}", (rank + 1).to_string().green(), factor);
        }
    }

    if let Some(weather) = &result.weather {
        println!(
            "Weather in {}: {:.1} °C, {:.0} % humidity, {}",
            weather.location, weather.temperature, weather.humidity, weather.description
        );
    }
}

fn print_error(error: &RecommendError) {
    eprintln!(
        "{} [{} / {}] {}",
        "✗".red(),
        error.code().red().bold(),
        error.status(),
        error
    );
}
