use std::io::Read;

use clap::Parser;
use tracing::Level;

use mermaid_drawio::DiagramConfig;

/// Upper bound for size and spacing flags.
const MAX_GEOMETRY: i64 = 100_000;

#[derive(Parser)]
#[command(name = "mermaid-drawio", about = "Convert Mermaid flowcharts to Draw.io diagrams")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    file: Option<std::path::PathBuf>,

    /// Write the Draw.io XML to this file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<std::path::PathBuf>,

    /// Print the Draw.io viewer URL instead of the XML
    #[arg(long)]
    url: bool,

    /// Also save the Mermaid source to this file (e.g. diagram.mmd)
    #[arg(long)]
    save_source: Option<std::path::PathBuf>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_GEOMETRY))]
    node_width: Option<u32>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_GEOMETRY))]
    node_height: Option<u32>,

    /// Distance between depth levels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_GEOMETRY))]
    rank_spacing: Option<u32>,

    /// Log parsing and layout decisions to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> DiagramConfig {
        let defaults = DiagramConfig::default();
        DiagramConfig {
            node_width: self.node_width.unwrap_or(defaults.node_width),
            node_height: self.node_height.unwrap_or(defaults.node_height),
            rank_spacing: self.rank_spacing.unwrap_or(defaults.rank_spacing),
            ..defaults
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("ERROR: failed to read {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
                eprintln!("ERROR: failed to read stdin: {e}");
                std::process::exit(1);
            });
            buf
        }
    };

    let conversion = match mermaid_drawio::convert_with_config(&input, &cli.config()) {
        Ok(conversion) => conversion,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &cli.save_source {
        write_or_exit(path, &conversion.source);
    }

    let output = if cli.url { &conversion.url } else { &conversion.xml };
    match &cli.output {
        Some(path) => write_or_exit(path, output),
        None => println!("{output}"),
    }
}

fn write_or_exit(path: &std::path::Path, contents: &str) {
    if let Err(e) = std::fs::write(path, contents) {
        eprintln!("ERROR: failed to write {}: {e}", path.display());
        std::process::exit(1);
    }
}
