use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distill::DistillConfig;
use crate::error::Result;
use crate::loader::LoaderOptions;

/// Settings file, e.g.
///
/// ```toml
/// [distill]
/// coverage_target = 0.75
/// max_categories = 3
///
/// [loader]
/// image_column = "Image name"
/// degenerate = "reject"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub distill: DistillConfig,
    pub loader: LoaderOptions,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.distill.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::loader::DegeneratePolicy;

    #[test]
    fn empty_file_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.distill.max_categories, 3);
        assert_eq!(config.loader.degenerate, DegeneratePolicy::Fallback);
    }

    #[test]
    fn partial_tables() {
        let config = Config::from_toml_str(
            r#"
            [distill]
            coverage_target = 0.9

            [loader]
            image_column = "Image name"
            degenerate = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.distill.coverage_target, 0.9);
        assert_eq!(config.distill.acceptance_ratio, 0.5);
        assert_eq!(config.loader.image_column.as_deref(), Some("Image name"));
        assert_eq!(config.loader.degenerate, DegeneratePolicy::Reject);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = Config::from_toml_str("[distill]\ncoverage = 0.9\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_values_rejected() {
        let err = Config::from_toml_str("[distill]\nmax_categories = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
