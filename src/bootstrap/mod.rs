mod handoff;
mod langpacks;
mod security;
mod tessdata;

pub use handoff::exec_command;
#[allow(unused_imports)]
pub use langpacks::{package_name, AptInstaller};
#[allow(unused_imports)]
pub use security::{fetch, plan, point_entrypoint_at, FetchPlan};
#[allow(unused_imports)]
pub use tessdata::stage;

use anyhow::Result;
use tracing::info;

use crate::config::BootstrapConfig;

/// Runs the preparation steps in order, stopping at the first failure. The
/// final handoff is the caller's job since it never returns on success.
pub fn run(config: &BootstrapConfig) -> Result<()> {
    let staged = tessdata::stage(&config.tessdata_source, &config.tessdata_target)?;
    if staged > 0 {
        info!(
            "Staged {staged} default OCR data files into {}",
            config.tessdata_target.display()
        );
    }

    if config.languages.is_empty() {
        info!("No extra OCR languages requested; skipping package install");
    } else {
        AptInstaller::new().install(&config.languages)?;
    }

    if let Some(plan) = security::plan(config) {
        security::fetch(&plan)?;
        security::point_entrypoint_at(&config.security_jar, &config.entrypoint_jar)?;
        info!(
            "Entry point {} now serves the secured artifact",
            config.entrypoint_jar.display()
        );
    }

    Ok(())
}
