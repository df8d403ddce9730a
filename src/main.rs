use std::io;

use tracing_subscriber::EnvFilter;
use virtual_biolab::{Crew, LabConfig, VirtualLab, repl};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("virtual_biolab=info,warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = LabConfig::from_env();
    if config.google_api_key.is_none() {
        tracing::warn!("GOOGLE_API_KEY is not set; runs will fail. Run `lab-setup` for help.");
    }

    let crew = Crew::from_config(&config);
    let crew = if config.verbose { crew.with_tracing() } else { crew };
    let mut lab = VirtualLab::new(&config, crew);

    repl::run_repl(&mut lab, &config.lab_name, io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
