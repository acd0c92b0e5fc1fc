use log::error;
use photo_locator::PhotoLocator;
use std::path::PathBuf;
use std::process::ExitCode;

const CONTACT_ENV: &str = "PHOTO_LOCATOR_CONTACT";

const HELP: &str = "\
Find where and when photos were taken.

USAGE:
  photo-locator [OPTIONS] PHOTO...

OPTIONS:
  --contact EMAIL    Contact sent to the geocoding provider [env: PHOTO_LOCATOR_CONTACT]
  --language LANG    Preferred address language [default: en]
  --precision N      Decimal places used for cache keys [default: 4]
  --json             Print reports as JSON
  -h, --help         Print this help
";

struct Args {
    contact: String,
    language: Option<String>,
    precision: Option<u32>,
    json: bool,
    photos: Vec<PathBuf>,
}

fn parse_args() -> Result<Option<Args>, Box<dyn std::error::Error>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(None);
    }

    let contact = match args.opt_value_from_str::<_, String>("--contact")? {
        Some(contact) => contact,
        None => std::env::var(CONTACT_ENV)
            .map_err(|_| format!("--contact or {CONTACT_ENV} is required"))?,
    };
    let language = args.opt_value_from_str("--language")?;
    let precision = args.opt_value_from_str("--precision")?;
    let json = args.contains("--json");
    let photos: Vec<PathBuf> = args
        .finish()
        .into_iter()
        .map(PathBuf::from)
        .collect();
    if photos.is_empty() {
        return Err("no photos given, see --help".into());
    }

    Ok(Some(Args {
        contact,
        language,
        precision,
        json,
        photos,
    }))
}

async fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let locator = PhotoLocator::builder()
        .contact(args.contact)
        .maybe_language(args.language)
        .maybe_precision(args.precision)
        .build()?;

    let mut all_ok = true;
    for photo in &args.photos {
        match locator.locate_file(photo).await {
            Ok(report) if args.json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(report) => {
                println!("{}", photo.display());
                println!("{report}");
            }
            Err(e) => {
                error!("Failed to locate {}: {e}", photo.display());
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
