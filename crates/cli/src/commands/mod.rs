//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_hud;
pub use validate::run_validate;

use std::path::Path;

use contracts::HudBlueprint;

use crate::error::{CliError, Result};

/// Load and validate the blueprint at `path`
pub(crate) fn load_blueprint(path: &Path) -> Result<HudBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    config_loader::ConfigLoader::load_from_path(path)
        .map_err(|e| CliError::config_load(path.display().to_string(), e))
}
