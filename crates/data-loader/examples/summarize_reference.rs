use data_loader::FeatureStatistics;
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = Path::new("data/crop_data.csv");

    println!("Loading reference dataset...\n");

    let start = Instant::now();
    let stats = FeatureStatistics::load_from_file(path)
        .expect("Failed to load reference dataset");
    let elapsed = start.elapsed();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Records: {}", stats.record_count());
    println!("Crops: {}", stats.labels().iter().cloned().collect::<Vec<_>>().join(", "));
    println!("\nHistorical means:");
    for (feature, mean) in stats.iter() {
        println!("  {:<12} {:>8.2}", feature.display_name(), mean);
    }
}
