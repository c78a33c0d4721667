use clap::{Parser, Subcommand};
use image_converter::config::{self, ConverterConfig};
use image_converter::format::TargetFormat;
use image_converter::output;
use image_converter::package::{DirectorySink, ResultSummary};
use image_converter::page::{PageOptions, render_page};
use image_converter::session::{Session, SourceSelection};
use std::path::{Path, PathBuf};

/// Target override shared by the commands that convert.
#[derive(clap::Args, Clone)]
struct TargetArgs {
    /// Target format: png, jpeg (or jpg) or webp [default: from config]
    #[arg(long)]
    to: Option<TargetFormat>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "image-converter")]
#[command(about = "Convert a PNG, JPEG, WebP or HEIC image to PNG, JPEG or WebP")]
#[command(long_about = "\
Convert a PNG, JPEG, WebP or HEIC image to PNG, JPEG or WebP

One image in, one image out. The result is always saved as
converted-image.<ext> in the output directory, whatever the input was
called. Encoding uses maximum quality; WebP is lossless.

HEIC input needs a build with `--features heic` (links libheif).

Run 'image-converter gen-config' to generate a documented converter.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file [default: ./converter.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory [default: from config]
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an image and save converted-image.<ext>
    Convert {
        /// Image to convert
        input: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        /// Also write the widget page to this file
        #[arg(long)]
        page: Option<PathBuf>,
        /// Print the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write the preview rendering of an image
    Preview {
        /// Image to preview
        input: PathBuf,
        /// Destination [default: <out-dir>/preview.<ext>]
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Convert an image and write the widget page showing the result
    Page {
        /// Image to convert
        input: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        /// Destination [default: <out-dir>/converter.html]
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List accepted inputs and target formats
    Formats,
    /// Print a stock converter.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            input,
            target,
            page,
            json,
        } => {
            let config = resolve_config(&cli.config, &cli.out_dir)?;
            let mut session = open_session(&config, &target, &input, !json)?;

            let result = session.convert()?.clone();
            let sink = DirectorySink::new(&config.output.dir);
            let saved = session.download(&sink)?;

            if let Some(page_path) = page {
                write_page(&session, &config, &page_path)?;
            }

            if json {
                let summary = ResultSummary::new(&result, Some(saved));
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_result(&result);
                output::print_saved(&saved);
            }
        }
        Command::Preview { input, out } => {
            let config = resolve_config(&cli.config, &cli.out_dir)?;
            let mut session = Session::new(config.session_options());
            let selection = SourceSelection::from_path(&input)?;
            output::print_selection(&selection);
            let status = session.select(selection);
            output::print_preview_status(&status);

            let Some(preview) = session.preview_resource() else {
                return Err(session
                    .last_error()
                    .unwrap_or("preview unavailable")
                    .into());
            };
            let path = out.unwrap_or_else(|| {
                config
                    .output
                    .dir
                    .join(format!("preview.{}", extension_for_mime(&preview.mime)))
            });
            ensure_parent(&path)?;
            std::fs::write(&path, &preview.bytes)?;
            output::print_saved(&path);
        }
        Command::Page { input, target, out } => {
            let config = resolve_config(&cli.config, &cli.out_dir)?;
            let mut session = open_session(&config, &target, &input, true)?;
            let converted = session.convert().cloned();

            let path = out.unwrap_or_else(|| config.output.dir.join("converter.html"));
            write_page(&session, &config, &path)?;
            output::print_saved(&path);

            let result = converted?;
            output::print_result(&result);
        }
        Command::Formats => {
            output::print_formats();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and apply CLI overrides on top.
fn resolve_config(
    path: &Option<PathBuf>,
    out_dir: &Option<PathBuf>,
) -> Result<ConverterConfig, config::ConfigError> {
    let mut config = config::load_config(path.as_deref())?;
    if let Some(dir) = out_dir {
        config.output.dir = dir.clone();
    }
    Ok(config)
}

/// Start a session, apply the target override and select `input`.
fn open_session(
    config: &ConverterConfig,
    target: &TargetArgs,
    input: &Path,
    verbose: bool,
) -> Result<Session, Box<dyn std::error::Error>> {
    let mut session = Session::new(config.session_options());
    if let Some(to) = target.to {
        session.set_target(to);
    }
    let selection = SourceSelection::from_path(input)?;
    if verbose {
        output::print_selection(&selection);
    }
    let status = session.select(selection);
    if verbose {
        output::print_preview_status(&status);
    }
    Ok(session)
}

fn write_page(
    session: &Session,
    config: &ConverterConfig,
    path: &Path,
) -> Result<(), std::io::Error> {
    let options = PageOptions {
        title: config.page.title.clone(),
    };
    ensure_parent(path)?;
    std::fs::write(path, render_page(session, &options))
}

fn ensure_parent(path: &Path) -> Result<(), std::io::Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// File extension for a preview's MIME type.
fn extension_for_mime(mime: &str) -> &'static str {
    mime.strip_prefix("image/")
        .and_then(|subtype| subtype.parse::<TargetFormat>().ok())
        .map(TargetFormat::extension)
        .unwrap_or("bin")
}
