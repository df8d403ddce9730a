use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use virtual_biolab::config::SETUP_INSTRUCTIONS;
use virtual_biolab::{LabConfig, validate_setup};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    println!("{SETUP_INSTRUCTIONS}");
    println!("{}", "=".repeat(50));

    let config = LabConfig::from_env();
    let report = validate_setup(&config);

    println!("Virtual lab setup check:");
    println!("{}", "-".repeat(40));
    for check in &report.checks {
        let mark = if check.ok { "ok  " } else { "FAIL" };
        println!("[{mark}] {}", check.message);
    }

    if report.is_ready() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
