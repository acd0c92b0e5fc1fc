use photo_locator::PhotoLocator;
use std::path::Path;

/// Locates a single photo and prints the report as JSON.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/sunset.jpg".to_string());
    let locator = PhotoLocator::builder()
        .contact("you@example.com")
        .build()?;
    let report = locator.locate_file(Path::new(&path)).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
