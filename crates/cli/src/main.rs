//! CLI tool for turning song lyrics into slide presentations.

mod http;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use slides_core::MismatchWarning;
use slides_core::{
    parse_batch_list, BatchEvent, BatchWorker, FetchPolicy, GenerationConfig, ImageSource,
    InputMode, LyricsLibrary, MismatchResolver, Pipeline, SlideStyle, SongRequest, StyleLibrary,
};
use slides_pptx::{PptxReader, PptxWriter};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::http::HttpImageFetcher;

/// Create song lyric presentations (.pptx).
#[derive(Parser, Debug)]
#[command(name = "lyric-slides")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder the presentations are written to
    #[arg(short, long, global = true, default_value = slides_core::config::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Folder holding style presets
    #[arg(long, global = true, default_value = "styles")]
    styles_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create one presentation
    Create(CreateArgs),
    /// Create one presentation per line of a "title, singer" list
    Batch(BatchArgs),
    /// Regenerate existing presentations with another style
    Restyle(RestyleArgs),
    /// Manage style presets
    Styles {
        #[command(subcommand)]
        action: StylesAction,
    },
}

#[derive(Subcommand, Debug)]
enum StylesAction {
    /// List available presets
    List,
    /// Install the built-in white and black background presets
    Init,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Style preset name
    #[arg(short, long)]
    style: Option<String>,

    /// Background picture, file path or http(s) URL
    #[arg(short, long)]
    background: Option<String>,

    /// Background opacity from 0.0 to 1.0
    #[arg(long)]
    opacity: Option<f32>,

    /// Continue without the background when it cannot be loaded
    #[arg(long)]
    skip_missing_background: bool,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Song title
    title: String,

    /// Singer or author
    #[arg(default_value = "")]
    singer: String,

    /// Read the lyrics from this file instead of the library
    #[arg(short, long)]
    lyrics: Option<PathBuf>,

    /// The lyrics file was typed by hand; skip boilerplate cleanup
    #[arg(short, long, requires = "lyrics")]
    manual: bool,

    /// Folder of "Title - Artist.txt" lyric files
    #[arg(long)]
    library: Option<PathBuf>,

    /// Title slide art, file path or http(s) URL
    #[arg(long)]
    art: Option<String>,

    /// Accept a different song than the one requested without asking
    #[arg(short, long)]
    yes: bool,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// File with one "title, singer" per line
    list: PathBuf,

    /// Folder of "Title - Artist.txt" lyric files
    #[arg(long)]
    library: PathBuf,

    /// Accept a different song than the one requested without asking
    #[arg(short, long)]
    yes: bool,

    /// Cancel the remaining songs after the first failure
    #[arg(long)]
    stop_on_error: bool,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct RestyleArgs {
    /// Presentations to regenerate
    #[arg(required = true)]
    input: Vec<PathBuf>,

    #[command(flatten)]
    style: StyleArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let styles = StyleLibrary::new(&cli.styles_dir);

    match &cli.command {
        Command::Create(args) => create(&cli, &styles, args),
        Command::Batch(args) => batch(&cli, &styles, args),
        Command::Restyle(args) => restyle(&cli, &styles, args),
        Command::Styles { action } => manage_styles(&styles, action),
    }
}

fn image_source(arg: &str) -> ImageSource {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        ImageSource::Url(arg.to_string())
    } else {
        ImageSource::File(PathBuf::from(arg))
    }
}

/// Build the configuration shared by all commands.
fn config(cli: &Cli, styles: &StyleLibrary, args: &StyleArgs, mode: InputMode) -> Result<GenerationConfig> {
    let style = match &args.style {
        Some(name) => styles
            .load(name)
            .with_context(|| format!("Failed to load style '{}'", name))?,
        None => SlideStyle::default(),
    };

    let mut config = GenerationConfig::new()
        .with_output_dir(&cli.output)
        .with_mode(mode)
        .with_style(style);

    if let Some(background) = &args.background {
        config = config.with_background(image_source(background));
    }
    if let Some(opacity) = args.opacity {
        config = config.with_background_opacity(opacity);
    }
    if args.skip_missing_background {
        config = config.with_background_policy(FetchPolicy::Skip);
    }

    Ok(config)
}

fn pipeline(config: GenerationConfig) -> Result<Pipeline> {
    let fetcher = HttpImageFetcher::new().context("Failed to set up the HTTP client")?;
    Ok(Pipeline::new(config, PptxWriter::new()).with_fetcher(fetcher))
}

/// Ask on the terminal whether a different song should be used.
fn prompt_mismatch(warning: &MismatchWarning) -> bool {
    eprint!(
        "Requested '{}' by '{}' but found '{}' by '{}'. Use it? [y/N] ",
        warning.requested.title, warning.requested.singer, warning.found_title, warning.found_artist
    );
    let _ = io::stderr().flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// Accepts every mismatch with `--yes`, otherwise asks.
#[derive(Debug, Clone, Copy)]
struct CliResolver {
    accept_all: bool,
}

impl MismatchResolver for CliResolver {
    fn confirm(&mut self, warning: &MismatchWarning) -> bool {
        self.accept_all || prompt_mismatch(warning)
    }
}

fn create(cli: &Cli, styles: &StyleLibrary, args: &CreateArgs) -> Result<()> {
    let mode = if args.manual {
        InputMode::Manual
    } else {
        InputMode::Search
    };
    let config = config(cli, styles, &args.style, mode)?;

    let generated = match (&args.lyrics, &args.library) {
        (Some(path), _) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let pipeline = pipeline(config)?;
            if args.manual {
                pipeline.generate_manual(&args.title, &args.singer, &text)?
            } else {
                let stanzas = pipeline.config().normalizer().normalize(&text)?;
                let art = args.art.as_deref().map(image_source);
                pipeline.render(&args.title, &args.singer, &stanzas, art.as_ref())?
            }
        }
        (None, Some(library)) => {
            let pipeline = pipeline(config)?.with_source(LyricsLibrary::new(library));
            let request = SongRequest::new(args.title.as_str(), args.singer.as_str());
            pipeline.generate(&request, &mut CliResolver { accept_all: args.yes })?
        }
        (None, None) => bail!("Either --lyrics or --library is required"),
    };

    println!("File: \"{}\" completed!", generated.file_name);
    if cli.verbose {
        eprintln!("Written to: {}", generated.path.display());
        eprintln!("{}", generated.summary);
    }
    Ok(())
}

fn batch(cli: &Cli, styles: &StyleLibrary, args: &BatchArgs) -> Result<()> {
    let list = fs::read_to_string(&args.list)
        .with_context(|| format!("Failed to read {}", args.list.display()))?;
    let requests = parse_batch_list(&list);
    if requests.is_empty() {
        bail!("No songs listed in {}", args.list.display());
    }

    let config = config(cli, styles, &args.style, InputMode::Batch)?;
    let pipeline = pipeline(config)?.with_source(LyricsLibrary::new(&args.library));

    let worker = BatchWorker::spawn(pipeline, requests, CliResolver { accept_all: args.yes })?;
    for event in worker.events() {
        print_batch_event(&event, cli.verbose);
        if stops_batch(&event, args.stop_on_error) {
            worker.cancel();
        }
    }

    let summary = worker.join()?;
    if summary.completed.is_empty() {
        bail!("No presentation was created");
    }
    if !summary.failed.is_empty() {
        eprintln!(
            "{} of {} songs failed",
            summary.failed.len(),
            summary.failed.len() + summary.completed.len()
        );
    }
    Ok(())
}

fn print_batch_event(event: &BatchEvent, verbose: bool) {
    match event {
        BatchEvent::ItemStarted { index, total, request } => {
            if verbose {
                eprintln!("[{}/{}] {} {}", index + 1, total, request.title, request.singer);
            }
        }
        BatchEvent::ItemCompleted { generated, .. } => {
            println!("File: \"{}\" completed!", generated.file_name);
        }
        BatchEvent::ItemFailed { request, error, .. } => {
            eprintln!("Error processing {}: {}", request.title, error);
        }
        BatchEvent::Progress { percent } => {
            if verbose {
                eprintln!("  {}%", percent);
            }
        }
        BatchEvent::Canceled { completed } => {
            eprintln!("Canceled after {} presentations", completed);
        }
        BatchEvent::Finished(_) => {}
    }
}

/// Whether the remaining songs should be canceled after `event`.
fn stops_batch(event: &BatchEvent, stop_on_error: bool) -> bool {
    stop_on_error && matches!(event, BatchEvent::ItemFailed { .. })
}

fn restyle(cli: &Cli, styles: &StyleLibrary, args: &RestyleArgs) -> Result<()> {
    let config = config(cli, styles, &args.style, InputMode::Search)?;
    let pipeline = pipeline(config)?;
    let reader = PptxReader::new();

    let mut failures = 0;
    for input_path in &args.input {
        if cli.verbose {
            eprintln!("Processing: {}", input_path.display());
        }
        match restyle_file(&pipeline, &reader, input_path) {
            Ok(file_name) => println!("File: \"{}\" completed!", file_name),
            Err(e) => {
                failures += 1;
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    if failures == args.input.len() {
        bail!("No presentation was restyled");
    }
    Ok(())
}

fn restyle_file(pipeline: &Pipeline, reader: &PptxReader, path: &Path) -> Result<String> {
    let generated = pipeline
        .restyle(reader, path)
        .with_context(|| format!("Failed to restyle {}", path.display()))?;
    Ok(generated.file_name)
}

fn manage_styles(styles: &StyleLibrary, action: &StylesAction) -> Result<()> {
    match action {
        StylesAction::List => {
            let names = styles.list_available()?;
            if names.is_empty() {
                eprintln!(
                    "No styles in {}; run `lyric-slides styles init`",
                    styles.dir().display()
                );
            }
            for name in names {
                println!("{}", name);
            }
        }
        StylesAction::Init => {
            for path in styles.install_builtin()? {
                println!("Written to: {}", path.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> BatchEvent {
        BatchEvent::ItemFailed {
            index: 0,
            request: SongRequest::new("Unknown", ""),
            error: "No lyrics found".to_string(),
        }
    }

    #[test]
    fn test_stop_on_error_cancels_after_failure() {
        assert!(stops_batch(&failed(), true));
        assert!(!stops_batch(&failed(), false));
        assert!(!stops_batch(&BatchEvent::Progress { percent: 50 }, true));
    }

    #[test]
    fn test_batch_flags() {
        let cli = Cli::parse_from(["lyric-slides", "batch", "songs.txt", "--library", "lyrics", "--stop-on-error"]);
        let Command::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        assert!(args.stop_on_error);
        assert!(!args.yes);
        assert_eq!(args.library, PathBuf::from("lyrics"));
    }

    #[test]
    fn test_image_source_from_argument() {
        assert_eq!(
            image_source("https://art.example/a.png"),
            ImageSource::Url("https://art.example/a.png".to_string())
        );
        assert_eq!(image_source("art.png"), ImageSource::File(PathBuf::from("art.png")));
    }
}
