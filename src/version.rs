//! Release update check against the GitHub releases API.

use serde::Deserialize;
use std::time::Duration;

/// Version compiled into this binary.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const REPO: &str = "solmap-dev/solmap";

#[derive(Debug, Deserialize)]
struct LatestRelease {
    #[serde(default)]
    tag_name: String,
}

/// Strip the conventional `v` prefix from a release tag.
fn normalize_tag(tag: &str) -> &str {
    tag.trim_start_matches('v')
}

/// True when a fetched tag differs from the running version.
fn is_newer(latest: &str, current: &str) -> bool {
    !latest.is_empty() && latest != current
}

/// Check GitHub for a newer release.
///
/// Returns the new version string if one exists. Never blocks the run:
/// any network or parse failure yields `None`.
pub async fn check_for_update() -> Option<String> {
    let url = format!("https://api.github.com/repos/{}/releases/latest", REPO);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .ok()?;
    let release: LatestRelease = client
        .get(&url)
        .header("Accept", "application/vnd.github.v3+json")
        .header("User-Agent", "solmap")
        .send()
        .await
        .ok()?
        .json()
        .await
        .ok()?;

    let latest = normalize_tag(&release.tag_name);
    is_newer(latest, CURRENT_VERSION).then(|| latest.to_string())
}

/// Where users download releases.
pub fn download_url() -> String {
    format!("https://github.com/{}/releases/latest", REPO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("v1.2.3"), "1.2.3");
        assert_eq!(normalize_tag("1.2.3"), "1.2.3");
        assert_eq!(normalize_tag(""), "");
    }

    #[test]
    fn test_is_newer() {
        assert!(is_newer("9.9.9", CURRENT_VERSION));
        assert!(!is_newer(CURRENT_VERSION, CURRENT_VERSION));
        assert!(!is_newer("", CURRENT_VERSION));
    }

    #[test]
    fn test_download_url() {
        assert!(download_url().contains(REPO));
    }

    #[test]
    fn test_release_parse_tolerates_missing_tag() {
        let release: LatestRelease = serde_json::from_str("{}").unwrap();
        assert!(release.tag_name.is_empty());
    }
}
