//! List the configured regions, years and composite pairs.

use crate::config;

pub fn regions() {
    println!("Regions (reference region first):");
    for region in config::regions() {
        println!("  {}", region.name);
    }

    let years: Vec<String> = config::years().iter().map(|y| y.to_string()).collect();
    println!("Years (most recent first): {}", years.join(", "));

    println!("Vertical composites:");
    for (top, bottom) in config::vertical_pairs() {
        println!("  {} over {}", top, bottom);
    }
}
