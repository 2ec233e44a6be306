use bpmn_layout::bpmn::{auto_layout_with, prepare_document, validate_structure};
use bpmn_layout::config::LayoutConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Deterministic auto-layout for BPMN process diagrams
#[derive(Parser, Debug)]
#[command(name = "bpmn-layout")]
#[command(version)]
#[command(about = "Compute a BPMN diagram layout and embed it in the document", long_about = None)]
struct Args {
    /// Input BPMN file (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Layout configuration file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Skip adding the XML declaration and BPMN namespace declarations
    #[arg(long)]
    raw: bool,

    /// Print a structural validation report as JSON to stderr
    #[arg(long)]
    report: bool,

    /// Exit with an error when the laid-out document fails validation
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => LayoutConfig::from_file(path).map_err(|e| e.to_string())?,
        None => LayoutConfig::default(),
    };

    let source = if args.input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)
            .map_err(|e| format!("Failed to read input file: {}", e))?
    };

    let prepared = if args.raw {
        source
    } else {
        prepare_document(&source)
    };
    let laid_out = auto_layout_with(&prepared, &config);

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &laid_out)
                .map_err(|e| format!("Failed to write output: {}", e))?;
            tracing::info!(path = %path.display(), "layout written");
        }
        None => {
            std::io::Write::write_all(&mut std::io::stdout(), laid_out.as_bytes())
                .map_err(|e| format!("Failed to write to stdout: {}", e))?;
        }
    }

    if args.report || args.strict {
        let report = validate_structure(&laid_out);
        if args.report {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to encode report: {}", e))?;
            eprintln!("{json}");
        }
        if args.strict && !report.valid {
            let issues: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
            return Err(format!("Validation failed: {}", issues.join("; ")));
        }
    }

    Ok(())
}
