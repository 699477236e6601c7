#![forbid(unsafe_code)]

use fxg_harness::{CliCommand, HarnessConfig, generate_inputs, parse_cli_args};

fn main() {
    if let Err(err) = run() {
        eprintln!("generate_inputs failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = match parse_cli_args(std::env::args().skip(1))? {
        CliCommand::Run(options) => options,
        CliCommand::Help => {
            println!(
                "Usage: cargo run -p fxg-harness --bin generate_inputs -- [--input-root <dir>] [--format raw_ascii|arma_ascii]"
            );
            return Ok(());
        }
    };

    let cfg = HarnessConfig::default_paths()
        .with_env_overrides()?
        .with_cli(&options)?;
    let count = generate_inputs(&cfg)?;

    println!("inputs: files={count} format={}", cfg.format.as_str());
    println!("wrote {}", cfg.input_root.display());
    Ok(())
}
