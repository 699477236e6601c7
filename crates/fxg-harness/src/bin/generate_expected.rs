#![forbid(unsafe_code)]

use fxg_harness::{
    CliCommand, HarnessConfig, generate_expected, parse_cli_args, set_run_log_path,
    write_manifest,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("generate_expected failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = match parse_cli_args(std::env::args().skip(1))? {
        CliCommand::Run(options) => options,
        CliCommand::Help => {
            println!(
                "Usage: cargo run -p fxg-harness --bin generate_expected -- [--input-root <dir>] [--output-root <dir>] [--format raw_ascii|arma_ascii] [--family <name|prefix>]... [--from-disk] [--log-path <path>]"
            );
            return Ok(());
        }
    };
    if options.log_path.is_some() {
        set_run_log_path(options.log_path.clone());
    }

    let cfg = HarnessConfig::default_paths()
        .with_env_overrides()?
        .with_cli(&options)?;
    let report = generate_expected(&cfg)?;
    let manifest_path = write_manifest(&cfg, &report)?;

    for run in &report.runs {
        println!(
            "{:<18} {:<28} tuples={:<6} written={:<6} skipped={:<6} suppressed={:<4} ms={}",
            run.name,
            run.prefix,
            run.tuple_count,
            run.written,
            run.skipped,
            run.suppressed,
            run.duration_ms
        );
    }
    for (reason, count) in &report.reasons {
        println!("  {reason}: {count}");
    }
    println!(
        "expected: written={} skipped={} suppressed={}",
        report.written(),
        report.skipped(),
        report.suppressed()
    );
    println!("wrote {}", manifest_path.display());
    Ok(())
}
