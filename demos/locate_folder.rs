use photo_locator::PhotoLocator;
use std::path::PathBuf;
use walkdir::WalkDir;

const PHOTO_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "tif", "tiff", "heic", "png", "webp"];

/// Walks a folder and prints where every photo in it was taken. Photos shot at the same
/// spot share one lookup thanks to the cache.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let start_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));
    let locator = PhotoLocator::builder()
        .contact("you@example.com")
        .build()?;

    let photos = WalkDir::new(&start_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        });

    for entry in photos {
        let report = locator.locate_file(entry.path()).await?;
        let place = report
            .address
            .as_ref()
            .map_or("Not found", |address| address.display_name.as_str());
        println!("{}\t{}", entry.path().display(), place);
    }
    println!(
        "{} distinct locations looked up",
        locator.cache().exact_len()
    );

    Ok(())
}
