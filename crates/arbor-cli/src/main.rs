//! Arbor CLI
//!
//! Usage:
//!   arbor render <FILE> -o <OUT.png> [--scale N] [--border N] [--width W --height H]
//!   arbor svg <FILE> [-o OUT.svg]
//!   arbor lint <FILE>
//!   arbor fmt <FILE> [--write] [--clear-positions]
//!   arbor new -o <OUT.json>
//!
//! Logging goes through `RUST_LOG` (e.g. `RUST_LOG=debug arbor lint doc.json`).

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use arbor_core::layout::{LayoutConfig, TreeLayout, Viewport, layout_tree};
use arbor_core::model::Diagram;
use arbor_core::{
    DocumentError, FormatConfig, LintSeverity, format_document, lint_document, load_document,
    save_document,
};
use arbor_render::{ExportConfig, ExportError, export_png, export_svg};

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Render, lint and format Arbor tree diagrams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rasterise a diagram to PNG
    Render {
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Pixels per canvas unit
        #[arg(long, default_value_t = 1.0)]
        scale: f32,

        /// Solid margin around the drawing
        #[arg(long, default_value_t = 30.0)]
        border: f32,

        #[command(flatten)]
        viewport: ViewportArgs,
    },

    /// Export a diagram as SVG (stdout unless -o is given)
    Svg {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = 30.0)]
        border: f32,

        #[command(flatten)]
        viewport: ViewportArgs,
    },

    /// Report structural problems
    Lint { input: PathBuf },

    /// Normalise a document (stdout unless --write)
    Fmt {
        input: PathBuf,

        /// Rewrite the file in place
        #[arg(long)]
        write: bool,

        /// Drop every manual position so auto-layout owns all nodes
        #[arg(long)]
        clear_positions: bool,

        /// Keep dangling, self and duplicate connections
        #[arg(long)]
        keep_connections: bool,
    },

    /// Write an empty document holding only the root
    New {
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Canvas size the root is anchored to.
#[derive(Args)]
struct ViewportArgs {
    #[arg(long, default_value_t = 600.0)]
    width: f32,

    #[arg(long, default_value_t = 400.0)]
    height: f32,
}

impl ViewportArgs {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{path}': {source}")]
    Document {
        path: PathBuf,
        source: DocumentError,
    },

    #[error(transparent)]
    Export(#[from] ExportError),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Render {
            input,
            output,
            scale,
            border,
            viewport,
        } => {
            let (diagram, layout) = open(&input, viewport.viewport())?;
            let config = ExportConfig::default()
                .with_scale(scale)
                .with_border(border);
            let png = export_png(&diagram, &layout, &config)?;
            write(&output, &png)?;
            log::info!("wrote {} ({} bytes)", output.display(), png.len());
        }

        Command::Svg {
            input,
            output,
            border,
            viewport,
        } => {
            let (diagram, layout) = open(&input, viewport.viewport())?;
            let svg = export_svg(
                &diagram,
                &layout,
                &ExportConfig::default().with_border(border),
            );
            match output {
                Some(path) => write(&path, svg.as_bytes())?,
                None => print!("{svg}"),
            }
        }

        Command::Lint { input } => {
            let (diagram, layout) = open(&input, Viewport::default())?;
            let diags = lint_document(&diagram, &layout);
            for d in &diags {
                let level = match d.severity {
                    LintSeverity::Warning => "warning",
                    LintSeverity::Info => "info",
                };
                println!("{}: {level}[{}] {}: {}", input.display(), d.rule, d.node_id, d.message);
            }
            if diags.is_empty() {
                log::info!("{}: no issues", input.display());
            }
        }

        Command::Fmt {
            input,
            write: in_place,
            clear_positions,
            keep_connections,
        } => {
            let text = read(&input)?;
            let config = FormatConfig::default()
                .with_prune_connections(!keep_connections)
                .with_clear_manual_positions(clear_positions);
            let formatted = format_document(&text, &config).map_err(|source| {
                CliError::Document {
                    path: input.clone(),
                    source,
                }
            })?;
            if in_place {
                write(&input, formatted.as_bytes())?;
            } else {
                print!("{formatted}");
            }
        }

        Command::New { output } => {
            let text = save_document(&Diagram::new()).map_err(|source| CliError::Document {
                path: output.clone(),
                source,
            })?;
            write(&output, text.as_bytes())?;
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a document and lay it out.
fn open(path: &Path, viewport: Viewport) -> Result<(Diagram, TreeLayout), CliError> {
    let text = read(path)?;
    let mut diagram = load_document(&text).map_err(|source| CliError::Document {
        path: path.to_path_buf(),
        source,
    })?;
    diagram.sync_class_heights();
    let layout = layout_tree(&diagram, viewport, &LayoutConfig::default(), None);
    Ok((diagram, layout))
}
