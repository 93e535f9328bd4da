use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its secrets directory and an initial `config.json` pointing at
/// `api_url`. If `token_file` is given it is moved into the secrets directory.
///
/// # Arguments
/// - `brgy_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/brgy-reports`
/// - `api_url` - The base URL of the barangay backend, e.g. `https://brgy.example.ph/api/`
/// - `token_file` - A file holding the bearer token the backend expects, if any.
///
/// # Errors
/// - Returns an error if `api_url` is invalid or if any file operations fail.
pub async fn init(brgy_home: &Path, api_url: &str, token_file: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(brgy_home, api_url, token_file)
        .await
        .context("Unable to create the home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created {} for {}",
        config.config_path().display(),
        config.api_base_url()
    )
    .into())
}
