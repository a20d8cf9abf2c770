use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base nodeci config directory (~/.config/nodeci/, %APPDATA%\nodeci on Windows)
pub fn nodeci() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("nodeci"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("nodeci"))
    }
}

/// Global nodeci.json config file path
pub fn nodeci_json() -> Result<PathBuf> {
    Ok(nodeci()?.join("nodeci.json"))
}
