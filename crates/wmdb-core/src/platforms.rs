use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::listing::slugify;
use crate::ConfigError;

/// Which adapter serves a platform's listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Live eBay Browse API.
    Ebay,
    /// Previously-scraped rows in the `archive_listings` table.
    Archive,
    /// Compiled-in fixture data for platforms without live access.
    Mock,
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::Ebay => write!(f, "ebay"),
            PlatformKind::Archive => write!(f, "archive"),
            PlatformKind::Mock => write!(f, "mock"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    pub kind: PlatformKind,
    pub enabled: bool,
    pub base_url: Option<String>,
    pub affiliate_tag: Option<String>,
    pub notes: Option<String>,
}

impl PlatformConfig {
    /// URL-safe slug derived from the platform name.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct PlatformsFile {
    pub platforms: Vec<PlatformConfig>,
}

impl PlatformsFile {
    /// Enabled platforms, optionally restricted to the given slugs.
    #[must_use]
    pub fn enabled(&self, restrict_to: Option<&[String]>) -> Vec<&PlatformConfig> {
        self.platforms
            .iter()
            .filter(|p| p.enabled)
            .filter(|p| match restrict_to {
                Some(slugs) => slugs.iter().any(|s| s == &p.slug()),
                None => true,
            })
            .collect()
    }
}

/// Load and validate the platform registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_platforms(path: &Path) -> Result<PlatformsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlatformsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let platforms_file: PlatformsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::PlatformsFileParse)?;

    validate_platforms(&platforms_file)?;

    Ok(platforms_file)
}

fn validate_platforms(platforms_file: &PlatformsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();
    let mut ebay_count = 0usize;

    for platform in &platforms_file.platforms {
        if platform.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "platform name must be non-empty".to_string(),
            ));
        }

        let lower_name = platform.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform name: '{}'",
                platform.name
            )));
        }

        let slug = platform.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform slug: '{}' (from platform '{}')",
                slug, platform.name
            )));
        }

        if platform.kind == PlatformKind::Ebay {
            ebay_count += 1;
        }
    }

    // The eBay adapter holds one OAuth client; two registry entries would
    // share credentials and affiliate tags ambiguously.
    if ebay_count > 1 {
        return Err(ConfigError::Validation(format!(
            "at most one platform may have kind 'ebay'; found {ebay_count}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(name: &str, kind: PlatformKind) -> PlatformConfig {
        PlatformConfig {
            name: name.to_string(),
            kind,
            enabled: true,
            base_url: None,
            affiliate_tag: None,
            notes: None,
        }
    }

    #[test]
    fn slug_simple_name() {
        assert_eq!(platform("Chrono24", PlatformKind::Archive).slug(), "chrono24");
    }

    #[test]
    fn slug_multi_word_name() {
        assert_eq!(
            platform("Crown and Caliber", PlatformKind::Mock).slug(),
            "crown-and-caliber"
        );
    }

    #[test]
    fn validate_rejects_empty_name() {
        let file = PlatformsFile {
            platforms: vec![platform("  ", PlatformKind::Mock)],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_name() {
        let file = PlatformsFile {
            platforms: vec![
                platform("WatchBox", PlatformKind::Archive),
                platform("watchbox", PlatformKind::Mock),
            ],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate platform name"));
    }

    #[test]
    fn validate_rejects_duplicate_slug() {
        let file = PlatformsFile {
            platforms: vec![
                platform("Bobs Watches", PlatformKind::Mock),
                platform("Bobs--Watches", PlatformKind::Archive),
            ],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate platform"));
    }

    #[test]
    fn validate_rejects_two_ebay_platforms() {
        let file = PlatformsFile {
            platforms: vec![
                platform("eBay", PlatformKind::Ebay),
                platform("eBay Motors", PlatformKind::Ebay),
            ],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("at most one"));
    }

    #[test]
    fn validate_accepts_valid_registry() {
        let file = PlatformsFile {
            platforms: vec![
                platform("eBay", PlatformKind::Ebay),
                platform("Chrono24", PlatformKind::Archive),
                platform("Bobs Watches", PlatformKind::Mock),
            ],
        };
        assert!(validate_platforms(&file).is_ok());
    }

    #[test]
    fn enabled_filters_disabled_platforms() {
        let mut disabled = platform("Crown and Caliber", PlatformKind::Mock);
        disabled.enabled = false;
        let file = PlatformsFile {
            platforms: vec![platform("eBay", PlatformKind::Ebay), disabled],
        };
        let enabled = file.enabled(None);
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].slug(), "ebay");
    }

    #[test]
    fn enabled_restricts_to_requested_slugs() {
        let file = PlatformsFile {
            platforms: vec![
                platform("eBay", PlatformKind::Ebay),
                platform("Chrono24", PlatformKind::Archive),
            ],
        };
        let restricted = file.enabled(Some(&["chrono24".to_string()]));
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].slug(), "chrono24");
    }

    #[test]
    fn load_platforms_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("platforms.yaml");
        assert!(
            path.exists(),
            "platforms.yaml missing at {path:?} — required for this test"
        );
        let result = load_platforms(&path);
        assert!(result.is_ok(), "failed to load platforms.yaml: {result:?}");
        let file = result.unwrap();
        assert!(!file.platforms.is_empty());
        assert!(file
            .platforms
            .iter()
            .any(|p| p.kind == PlatformKind::Ebay));
    }

    #[test]
    fn platform_kind_display() {
        assert_eq!(PlatformKind::Ebay.to_string(), "ebay");
        assert_eq!(PlatformKind::Archive.to_string(), "archive");
        assert_eq!(PlatformKind::Mock.to_string(), "mock");
    }
}
