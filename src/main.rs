use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use saferoute::{
    GeoapifyGeocoder, GeoapifyRouting, Geocoder, HttpRiskInference, MapRenderer, OverpassProvider,
    PlacesProvider, PoiEnricher, PoiProvider, RiskClassifier, RouteFetcher, SafeRouteConfig,
    SafeRoutePlanner, ScoringStrategy,
};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [start_text, end_text] = args.as_slice() else {
        eprintln!("Usage: saferoute <start location> <end location>");
        eprintln!("Example: saferoute \"Connaught Place, Delhi\" \"Gulshan, Dhaka\"");
        return ExitCode::FAILURE;
    };

    // Input shorter than 3 characters never reaches the geocoder
    for text in [start_text, end_text] {
        if text.trim().len() < 3 {
            eprintln!("Please enter at least 3 characters per location.");
            return ExitCode::FAILURE;
        }
    }

    let config = match SafeRouteConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    match run(&config, start_text, end_text) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(config: &SafeRouteConfig, start_text: &str, end_text: &str) -> saferoute::Result<()> {
    let geocoder = Geocoder::new(Box::new(GeoapifyGeocoder::new(config)?), config);
    let fetcher = RouteFetcher::new(Box::new(GeoapifyRouting::new(config)?), config);

    let providers: Vec<Box<dyn PoiProvider>> = vec![
        Box::new(OverpassProvider::new(config)?),
        Box::new(PlacesProvider::new(config)?),
    ];
    let enricher = PoiEnricher::new(providers, config);
    let classifier = RiskClassifier::new(Box::new(HttpRiskInference::new(config)?), config);

    let strategy = ScoringStrategy::from_config(config, enricher, classifier);
    let renderer = MapRenderer::new(config);

    let planner = SafeRoutePlanner::new(geocoder, fetcher, strategy, renderer);
    let outcome = planner.plan_safe_route(start_text, end_text)?;

    println!(
        "Route from '{}' to '{}': {:.1} km, {} segments, overall risk score {}",
        start_text,
        end_text,
        outcome.length_km,
        outcome.result.segments.len(),
        outcome.result.overall_score
    );
    println!("Safety map saved to: {}", outcome.artifact_path.display());

    Ok(())
}
