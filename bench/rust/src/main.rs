//! Filter pipeline latency benchmark - synthetic catalog around Dundee
//!
//! Each trial simulates a position update followed by a filter chip change,
//! i.e. the two recomputations that happen back to back on the discovery screen.

use clap::Parser;
use std::time::Instant;
use venue_discovery::domain::venue::HalalInfo;
use venue_discovery::domain::{
    Coordinate, Favourites, FilterMode, FilterState, HalalStatus, Position, PriceTier, Venue,
    VenueId,
};
use venue_discovery::services::FilterPipeline;

const CUISINES: [&str; 6] = ["Indian", "Grill", "Peri Peri", "Turkish", "Desserts", "Pakistani"];
const STATUSES: [HalalStatus; 4] =
    [HalalStatus::AllHalal, HalalStatus::Partial, HalalStatus::Mixed, HalalStatus::Unknown];

#[derive(Parser)]
#[command(name = "pipeline-bench")]
struct Args {
    /// Catalog size
    #[arg(long, default_value = "5000")]
    venues: usize,
    #[arg(short, long, default_value = "200")]
    trials: u32,
    #[arg(long, default_value = "10.0")]
    radius_miles: f64,
}

/// Deterministic spread of venues over roughly 40 x 40 miles
fn synthetic_catalog(n: usize) -> Vec<Venue> {
    (0..n)
        .map(|i| {
            let lat = 56.2 + (i % 97) as f64 * 0.006;
            let lng = -3.3 + (i % 89) as f64 * 0.0085;
            Venue {
                id: VenueId::new(format!("venue_{:05}", i)),
                name: format!("Venue {}", i),
                cuisine: CUISINES[i % CUISINES.len()].to_string(),
                tags: vec!["takeaway".to_string(), format!("area-{}", i % 13)],
                location: if i % 50 == 0 { None } else { Some(Coordinate::new(lat, lng)) },
                halal_info: HalalInfo { overall_status: STATUSES[i % STATUSES.len()], notes: None },
                alcohol_info: Default::default(),
                price: PriceTier::Moderate,
                city: if lat > 56.4 { "Dundee".to_string() } else { "St Andrews".to_string() },
                area: None,
                address: Default::default(),
            }
        })
        .collect()
}

fn main() {
    let args = Args::parse();
    let catalog = synthetic_catalog(args.venues);
    let favourites: Favourites = catalog.iter().step_by(7).map(|v| v.id.clone()).collect();
    let pipeline = FilterPipeline::new(args.radius_miles);
    let modes = FilterMode::ALL_MODES;

    println!("Pipeline Benchmark");
    println!("==================");
    println!("Venues: {}", catalog.len());
    println!("Trials: {}", args.trials);
    println!("Radius: {} mi\n", args.radius_miles);

    let mut results: Vec<u64> = Vec::with_capacity(args.trials as usize);
    let mut matched = 0usize;

    for trial in 0..args.trials {
        // Walk the position north-east a little on every trial
        let step = trial as f64 * 0.001;
        let position = Position::new(56.46 + step, -2.97 + step, trial as u64 * 1000);
        let filter = FilterState::new(modes[trial as usize % modes.len()]);

        let start = Instant::now();
        let nearby =
            pipeline.apply(&catalog, &FilterState::default(), &favourites, Some(&position));
        let filtered = pipeline.apply(&catalog, &filter, &favourites, Some(&position));
        results.push(start.elapsed().as_micros() as u64);
        matched += nearby.len() + filtered.len();
    }

    // Stats
    println!("=============================");
    println!("Results:");
    if results.is_empty() {
        println!("  No trials!");
        return;
    }
    let sum: u64 = results.iter().sum();
    let avg = sum / results.len() as u64;
    let mut sorted = results.clone();
    sorted.sort();
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let p50 = sorted[sorted.len() / 2];
    let p95 = sorted[(sorted.len() as f64 * 0.95) as usize].min(max);

    println!("  Min: {} us", min);
    println!("  Max: {} us", max);
    println!("  Avg: {} us", avg);
    println!("  P50: {} us", p50);
    println!("  P95: {} us", p95);
    println!("  Avg results/trial: {}", matched / results.len());
}
