use anyhow::Result;
use clap::Parser;
use setmerge::merge::{run, RunConfig, RunError};
use setmerge::report::RunSummary;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "setmerge",
    about = "Merge multi-sheet ISAMS set exports into one consolidated workbook"
)]
struct Cli {
    /// Directory containing the .xlsx exports
    #[arg(short, long, default_value = "uploads")]
    input_dir: PathBuf,

    /// Directory the merged workbook is written to
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Base name for the versioned output file ({base}_{N}.xlsx)
    #[arg(long, default_value = "merged_sets")]
    base_name: String,

    /// Reject a sheet outright when its teacher cell is missing or too short,
    /// instead of tagging its rows with a sentinel
    #[arg(long)]
    strict_teacher: bool,

    /// Print the run summary as JSON instead of the text block
    #[arg(long)]
    json: bool,
}

fn print_summary(summary: &RunSummary) {
    println!("{}", "=".repeat(50));
    println!("PROCESSING COMPLETE");
    println!("{}", "=".repeat(50));
    println!("Files found:      {}", summary.stats.files_found);
    println!("Files processed:  {}", summary.stats.files_processed);
    println!("Files failed:     {}", summary.stats.files_failed);
    println!("Sheets processed: {}", summary.stats.sheets_processed);
    println!("Sheets skipped:   {}", summary.stats.sheets_skipped);
    println!("Rows in output:   {}", summary.stats.rows_merged);
    if let Some(path) = &summary.output_path {
        println!("Output file:      {}", path.display());
    }
    if !summary.errors.is_empty() {
        println!("\nProblems encountered:");
        for error in &summary.errors {
            println!("  - {error}");
        }
    }
}

fn report(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print_summary(summary);
    }
    Ok(())
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    let config = RunConfig {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        base_name: cli.base_name,
        strict_teacher: cli.strict_teacher,
    };
    info!(input = %config.input_dir.display(), output = %config.output_dir.display(), "startup");

    match run(&config) {
        Ok(output) => {
            report(&output.summary, cli.json)?;
            let warnings = output.summary.warning_count();
            if !cli.json {
                if warnings > 0 {
                    println!("\nsucceeded with {warnings} warning(s)");
                } else {
                    println!("\nsucceeded");
                }
            }
            Ok(())
        }
        Err(RunError::NoValidData { summary }) => {
            report(&summary, cli.json)?;
            eprintln!("failed: no worksheet produced any usable data");
            std::process::exit(1);
        }
        Err(RunError::Write(e)) if e.is_permission_denied() => {
            eprintln!("failed: {e}");
            eprintln!("close the output file if it is open in Excel and rerun");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("failed: {e}");
            std::process::exit(1);
        }
    }
}
