use clap::{Parser, Subcommand};
use qrsize::batch::{self, BatchOptions, BatchSettings};
use qrsize::dimensions::{EditOutcome, Field, ResizeForm};
use qrsize::export::DirectorySink;
use qrsize::imaging::RustBackend;
use qrsize::qr::{QrRequest, QrSession, QrStyle};
use qrsize::{config, ingest, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("QRSIZE_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("QRSIZE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "qrsize")]
#[command(about = "QR code generator and batch image resizer")]
#[command(long_about = "\
QR code generator and batch image resizer

  qrsize qr \"https://example.com\" --logo logo.png
      Writes QRCode.pdf: the QR code on a white square, with the logo
      centered on top at 30% opacity.

  qrsize resize photos/ --width 400
      Writes resized_image_0.jpg, resized_image_1.jpg, ... Each image keeps
      its own aspect ratio: the height is derived per image. Use --no-lock
      to stretch every image to the exact --width/--height pair.
      Without --width or --height, every image is stretched to the size of
      the last loaded image (the first one with --no-lock).

Run 'qrsize gen-config' to generate a documented qrsize.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Output directory
    #[arg(long, default_value = ".", global = true)]
    output: PathBuf,

    /// Directory containing qrsize.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ResizeArgs {
    /// Image files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Target width in pixels
    #[arg(long)]
    width: Option<String>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<String>,

    /// Stretch to the exact size instead of keeping each image's ratio
    #[arg(long)]
    no_lock: bool,

    /// Descend into subdirectories
    #[arg(long)]
    recursive: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct QrArgs {
    /// Text or URL to encode (may be empty)
    #[arg(default_value = "")]
    text: String,

    /// Logo image to overlay
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Also write a PNG next to the PDF
    #[arg(long)]
    png: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Decode images and show their intrinsic size and ratio
    Identify {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,
    },
    /// Resize images to JPEG
    Resize(ResizeArgs),
    /// Generate a QR code and export it as PDF
    Qr(QrArgs),
    /// Print a stock qrsize.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Identify { paths, recursive } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let backend = RustBackend::new();
            let ingested =
                ingest::ingest(&backend, &paths, recursive || config.resize.recursive)?;
            output::print_ingest_output(&ingested);
        }
        Command::Resize(args) => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let backend = RustBackend::new();
            let ingested = ingest::ingest(
                &backend,
                &args.paths,
                args.recursive || config.resize.recursive,
            )?;
            output::print_ingest_output(&ingested);
            println!();

            let lock = !args.no_lock && config.resize.lock_aspect;
            let settings = form_settings(&ingested, lock, &args);
            let options = BatchOptions {
                filename_prefix: config.resize.filename_prefix.clone(),
            };
            let sink = DirectorySink::new(&cli.output);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_resize_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::execute_batch(
                &backend,
                &sink,
                &ingested.images,
                &settings,
                &options,
                Some(tx),
            );
            printer.join().ok();
            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            };

            output::print_batch_summary(&report);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Qr(args) => {
            let config = config::load_config(&cli.config)?;
            let logo = args.logo.as_ref().map(std::fs::read).transpose()?;
            let mut session = QrSession::from_request(
                QrStyle::from_config(&config.qr),
                QrRequest {
                    payload: args.text,
                    logo,
                },
            )?;
            session.generate()?;

            let sink = DirectorySink::new(&cli.output);
            let mut written = Vec::new();
            session.export_pdf(&sink, &config.qr.pdf_filename)?;
            written.push(sink.path_for(&config.qr.pdf_filename));
            if args.png {
                session.export_png(&sink, &config.qr.png_filename)?;
                written.push(sink.path_for(&config.qr.png_filename));
            }
            output::print_qr_output(session.payload(), session.has_logo(), &written);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Drive the resize form the way a user would: load every image, then type
/// the requested width and/or height.
///
/// A rejected edit leaves the form untouched, so the raw text is placed in
/// the snapshot directly and batch validation reports it.
fn form_settings(ingested: &ingest::Ingested, lock: bool, args: &ResizeArgs) -> BatchSettings {
    let mut form = ResizeForm::new(lock);
    for image in &ingested.images {
        form.load_image(image.dimensions());
    }

    if !form.is_loaded() {
        return BatchSettings {
            width: args.width.clone().unwrap_or_default(),
            height: args.height.clone().unwrap_or_default(),
            lock_aspect: lock,
            anchor: None,
        };
    }

    if args.width.is_none() && args.height.is_none() {
        println!(
            "No --width or --height given, resizing every image to {}x{}",
            form.width_text(),
            form.height_text()
        );
    }

    // Two explicit values only make sense as an exact size
    if args.width.is_some() && args.height.is_some() && form.lock_aspect() {
        println!("Both --width and --height given, resizing without aspect lock");
        form.set_lock(false);
    }

    let mut rejected = Vec::new();
    for (field, raw) in [(Field::Width, &args.width), (Field::Height, &args.height)] {
        if let Some(raw) = raw {
            if let EditOutcome::Rejected(_) = form.edit(field, raw) {
                rejected.push((field, raw.clone()));
            }
        }
    }

    let mut settings = form.settings();
    for (field, raw) in rejected {
        match field {
            Field::Width => settings.width = raw,
            Field::Height => settings.height = raw,
        }
    }
    settings
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
