//! Reflow recorded backend responses into a document
//!
//! Reads a JSON array of `{page, png_path, response}` entries, where each
//! `response` is a recorded recognition result, and writes the reconstructed
//! document (text plus per-word coordinates) as JSON.
//!
//! Usage:
//!   cargo run --release --bin reflow_document -- responses.json
//!   cargo run --release --bin reflow_document -- responses.json --output document.json
//!   cargo run --release --bin reflow_document -- responses.json --text

use scan_reflow::model::PageImage;
use scan_reflow::pipeline::reconstruct_document;
use scan_reflow::recognition::BackendResponse;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Deserialize)]
struct RecordedPage {
    page: u32,
    png_path: PathBuf,
    response: BackendResponse,
}

struct ReflowArgs {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    text_only: bool,
}

impl ReflowArgs {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut input = None;
        let mut output = None;
        let mut text_only = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--output" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        output = Some(PathBuf::from(&args[i]));
                    }
                },
                "--text" => {
                    text_only = true;
                },
                other => {
                    input = Some(PathBuf::from(other));
                },
            }
            i += 1;
        }

        Self {
            input,
            output,
            text_only,
        }
    }
}

fn run(args: &ReflowArgs, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let recorded: Vec<RecordedPage> = serde_json::from_str(&fs::read_to_string(input)?)?;
    log::info!("Loaded {} recorded page(s) from {}", recorded.len(), input.display());

    let pages = recorded
        .into_iter()
        .map(|r| (PageImage::new(r.page, r.png_path), r.response))
        .collect();
    let document = reconstruct_document(pages);
    document.verify_offsets()?;

    let rendered = if args.text_only {
        document.text.clone()
    } else {
        document.to_json()?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            eprintln!(
                "Wrote {} page(s), {} word(s) to {} in {:.2}s",
                document.pages.len(),
                document.words().count(),
                path.display(),
                start_time.elapsed().as_secs_f64()
            );
        },
        None => println!("{}", rendered),
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let args = ReflowArgs::from_args();
    let Some(input) = args.input.clone() else {
        eprintln!("Usage: reflow_document <responses.json> [--output <path>] [--text]");
        std::process::exit(2);
    };

    if let Err(e) = run(&args, &input) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
