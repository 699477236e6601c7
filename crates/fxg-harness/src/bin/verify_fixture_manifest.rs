#![forbid(unsafe_code)]

use fxg_harness::{CliCommand, HarnessConfig, parse_cli_args, verify_manifest};

fn main() {
    if let Err(err) = run() {
        eprintln!("verify_fixture_manifest failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = match parse_cli_args(std::env::args().skip(1))? {
        CliCommand::Run(options) => options,
        CliCommand::Help => {
            println!(
                "Usage: cargo run -p fxg-harness --bin verify_fixture_manifest -- [--output-root <dir>]"
            );
            return Ok(());
        }
    };

    let cfg = HarnessConfig::default_paths()
        .with_env_overrides()?
        .with_cli(&options)?;
    let report = verify_manifest(&cfg)?;

    println!(
        "{}: cases={} passed={} failed={}",
        report.suite,
        report.case_count,
        report.pass_count,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {failure}");
    }

    if !report.all_passed() {
        std::process::exit(2);
    }
    Ok(())
}
