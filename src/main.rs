//! Doc Template CLI
//!
//! Usage:
//!   doc-template [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -t, --template-file <FILE>  Read the template from a file
//!   -d, --document <FILE>       Document to render against (JSON or TOML)
//!   -c, --config <FILE>         Render configuration (TOML format)
//!   -v, --verbose...            Log parse and render steps to stderr
//!   -h, --help                  Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use doc_template::{render_with_config, Node, RenderConfig};

#[derive(Parser)]
#[command(name = "doc-template")]
#[command(about = "Render text templates against JSON or TOML documents")]
struct Cli {
    /// Template text, e.g. '{{ .spec.replicas }}'
    #[arg(required_unless_present = "template_file")]
    template: Option<String>,

    /// Read the template from a file instead
    #[arg(short, long, conflicts_with = "template")]
    template_file: Option<PathBuf>,

    /// Document file, JSON or TOML by extension (reads JSON from stdin if not provided)
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Render configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => match RenderConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };

    // Read template
    let (template, filename) = match (&cli.template, &cli.template_file) {
        (_, Some(path)) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading template '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        (Some(text), None) => (text.clone(), "<template>".to_string()),
        (None, None) => {
            eprintln!("Error: no template given");
            std::process::exit(1);
        }
    };

    // Load document
    let document = match &cli.document {
        Some(path) => match Node::from_file(path) {
            Ok(node) => node,
            Err(e) => {
                eprintln!("Error loading document '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None if io::stdin().is_terminal() => Node::Null,
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading from stdin: {}", e);
                std::process::exit(1);
            }
            if buffer.trim().is_empty() {
                Node::Null
            } else {
                match Node::from_json_str(&buffer) {
                    Ok(node) => node,
                    Err(e) => {
                        eprintln!("Error parsing document from stdin: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
    };

    match render_with_config(&document, &template, &config) {
        Ok(text) => {
            println!("{}", text);
        }
        Err(e) => {
            eprintln!("{}", e.format(&template, &filename));
            std::process::exit(1);
        }
    }
}
