use std::process::ExitCode;

use clap::Parser;
use png2svg::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    png2svg::init_tracing(args.verbose);

    let report = match png2svg::run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("✓ Successfully converted to {}", report.output.display());
    }

    ExitCode::SUCCESS
}
