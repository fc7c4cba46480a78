#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for stagehook
//!
//! This crate provides the pipeline stage identifiers and small shared
//! enums used by configuration, events and the CLI.

use serde::{Deserialize, Serialize};
use stagehook_errors::ConfigError;
use std::fmt;
use std::str::FromStr;

/// A named step of the build pipeline.
///
/// Stage names are case-sensitive and fixed; they are what build
/// configuration refers to when attaching pre-actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Package the web assets and data directory into a filesystem image
    AssembleFilesystemImage,
    /// Flash the filesystem image to the device
    UploadFilesystemImage,
    /// Flash the firmware binary to the device
    UploadFirmware,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 3] = [
        Stage::AssembleFilesystemImage,
        Stage::UploadFilesystemImage,
        Stage::UploadFirmware,
    ];

    /// Canonical stage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AssembleFilesystemImage => "assemble-filesystem-image",
            Self::UploadFilesystemImage => "upload-filesystem-image",
            Self::UploadFirmware => "upload-firmware",
        }
    }

    /// Human readable description of what the stage does
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AssembleFilesystemImage => "Build the filesystem image",
            Self::UploadFilesystemImage => "Upload the filesystem image",
            Self::UploadFirmware => "Upload the firmware",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownStage {
                name: s.to_string(),
            })
    }
}

impl clap::ValueEnum for Stage {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()).help(self.description()))
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

impl FromStr for ColorChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "auto" => Ok(Self::Auto),
            "never" => Ok(Self::Never),
            _ => Err(ConfigError::InvalidValue {
                field: "color".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_case_sensitive() {
        assert_eq!(
            "upload-firmware".parse::<Stage>().unwrap(),
            Stage::UploadFirmware
        );
        assert!("Upload-Firmware".parse::<Stage>().is_err());
    }

    #[test]
    fn stages_listed_in_pipeline_order() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            [
                "assemble-filesystem-image",
                "upload-filesystem-image",
                "upload-firmware"
            ]
        );
    }
}
