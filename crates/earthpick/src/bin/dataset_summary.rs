//! Fetch the country dataset and print what the viewer will label.
//!
//! Run: `cargo run -p earthpick --features tools --bin dataset_summary -- [dataset_url]`

use std::env;

use earthpick::Client;
use earthpick_core::{GlobeParams, LabelSettings, is_eligible};

const LARGEST_SHOWN: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let client = env::args()
        .nth(1)
        .map_or_else(Client::new, Client::with_dataset_url);

    println!("Fetching {}...\n", client.dataset_url());
    let records = client.fetch_records(GlobeParams::default().radius).await?;
    println!("{} countries (indices 1..={})", records.len(), records.len());

    let settings = LabelSettings::default();
    let labelled: Vec<_> = records
        .iter()
        .filter(|record| is_eligible(record, false, &settings))
        .collect();
    println!(
        "\n=== Labelled with nothing selected (area >= {}) ===",
        settings.min_area * settings.min_area
    );
    for record in &labelled {
        println!("  {:>3}  {}", record.index, record.name);
    }
    println!("  ({} of {})", labelled.len(), records.len());

    let mut by_area: Vec<_> = records.iter().collect();
    by_area.sort_by(|a, b| b.bounding_box_area.total_cmp(&a.bounding_box_area));
    println!("\n=== Largest bounding boxes ===");
    for record in by_area.iter().take(LARGEST_SHOWN) {
        println!(
            "  {:>3}  {:<32} {:>10.1}",
            record.index, record.name, record.bounding_box_area
        );
    }

    Ok(())
}
