// src/bin/analyze_chart.rs
use chart_analyzer::analyzer::{analyze_chart_with, AnalysisOptions};
use chart_analyzer::config::AppConfig;
use chart_analyzer::imaging::decode_chart_image;
use chart_analyzer::risk::assess_risk_reward;
use chart_analyzer::suggestion::{get_trading_suggestion, SuggestionProvider};
use chart_analyzer::types::Timeframe;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "analyze-chart")]
#[command(about = "Detect patterns and indicators in a chart image and suggest a trade")]
struct Args {
    /// JPEG or PNG chart image
    image: PathBuf,

    /// Chart timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1D, 1W)
    #[arg(short, long, default_value = "1h")]
    timeframe: String,

    /// Seed for the indicator synthesizer
    #[arg(short, long)]
    seed: Option<u64>,

    /// Skip the generative suggestion even when OPENAI_API_KEY is set
    #[arg(long)]
    rule_based: bool,

    #[arg(short, long)]
    debug: bool,
}

fn setup_logging(debug: bool) {
    use env_logger::{Builder, Target};
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.target(Target::Stderr);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging(args.debug);
    let config = AppConfig::from_env()?;

    let bytes = std::fs::read(&args.image)?;
    let image = decode_chart_image(&bytes, config.max_dimension())?;
    let timeframe = Timeframe::from(args.timeframe.as_str());
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let options = AnalysisOptions {
        timeframe_weighting: config.timeframe_weighting,
    };
    let analysis = analyze_chart_with(&image, &timeframe, options, &mut rng)?;

    let client = if args.rule_based { None } else { config.openai_client()? };
    let provider = client.as_ref().map(|c| c as &dyn SuggestionProvider);
    let outcome = get_trading_suggestion(provider, &analysis, &timeframe).await;

    let output = json!({
        "timeframe": timeframe,
        "patterns": analysis.patterns,
        "indicators": analysis.indicators,
        "trading_suggestion": outcome.suggestion,
        "suggestion_source": outcome.source,
        "risk_reward": assess_risk_reward(&outcome.suggestion),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
