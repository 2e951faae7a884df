//! Saved-token storage under the platform config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SolmapError};

const CREDENTIALS_FILE: &str = "config.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    pat: Option<String>,
}

/// Platform-appropriate config directory for this tool.
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| SolmapError::Config("No config directory on this platform".to_string()))?;
    Ok(base.join("solmap"))
}

/// Previously saved token, if any.
pub fn load_saved_pat() -> Option<String> {
    load_pat_from(&config_dir().ok()?)
}

/// Save a token for future runs. Returns the file written.
pub fn save_pat(pat: &str) -> Result<PathBuf> {
    save_pat_to(&config_dir()?, pat)
}

pub(crate) fn load_pat_from(dir: &Path) -> Option<String> {
    let text = fs::read_to_string(dir.join(CREDENTIALS_FILE)).ok()?;
    serde_json::from_str::<StoredCredentials>(&text)
        .ok()?
        .pat
        .filter(|pat| !pat.is_empty())
}

pub(crate) fn save_pat_to(dir: &Path, pat: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let file = dir.join(CREDENTIALS_FILE);
    let body = serde_json::to_string(&StoredCredentials {
        pat: Some(pat.to_string()),
    })?;
    fs::write(&file, body)?;

    // Tokens on disk should not be group/world readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&file, fs::Permissions::from_mode(0o600))?;
    }

    Ok(file)
}

/// Masked form for display: only the last 4 characters visible.
pub fn mask_pat(pat: &str) -> String {
    let chars: Vec<char> = pat.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
