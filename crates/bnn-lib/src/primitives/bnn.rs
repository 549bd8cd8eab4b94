use clap::ValueEnum;
use clap::builder::PossibleValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::shared::impl_fromstr_for_value_enum;

/// Output resolution requested from the image API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    /// ~1024px on the long edge
    OneK,
    /// ~2048px on the long edge
    TwoK,
    /// ~4096px on the long edge
    FourK,
}

impl Resolution {
    /// Upper-case size hint understood by the Gemini image config
    pub fn api_size(&self) -> &'static str {
        match self {
            Resolution::OneK => "1K",
            Resolution::TwoK => "2K",
            Resolution::FourK => "4K",
        }
    }
}

impl ValueEnum for Resolution {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::OneK, Self::TwoK, Self::FourK]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::OneK => Some(PossibleValue::new("1k")),
            Self::TwoK => Some(PossibleValue::new("2k")),
            Self::FourK => Some(PossibleValue::new("4k")),
        }
    }
}

/// Aspect ratio of generated images; `auto` lets the model keep the input shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    Auto,
    Square,
    Portrait2x3,
    Landscape3x2,
    Portrait3x4,
    Landscape4x3,
    Portrait4x5,
    Landscape5x4,
    Portrait9x16,
    Landscape16x9,
    Ultrawide21x9,
}

impl AspectRatio {
    /// Ratio string for the API, `None` when the model should decide
    pub fn api_ratio(&self) -> Option<String> {
        match self {
            AspectRatio::Auto => None,
            other => Some(other.as_str()),
        }
    }
}

impl ValueEnum for AspectRatio {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Self::Auto,
            Self::Square,
            Self::Portrait2x3,
            Self::Landscape3x2,
            Self::Portrait3x4,
            Self::Landscape4x3,
            Self::Portrait4x5,
            Self::Landscape5x4,
            Self::Portrait9x16,
            Self::Landscape16x9,
            Self::Ultrawide21x9,
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Auto => Some(PossibleValue::new("auto")),
            Self::Square => Some(PossibleValue::new("1:1")),
            Self::Portrait2x3 => Some(PossibleValue::new("2:3")),
            Self::Landscape3x2 => Some(PossibleValue::new("3:2")),
            Self::Portrait3x4 => Some(PossibleValue::new("3:4")),
            Self::Landscape4x3 => Some(PossibleValue::new("4:3")),
            Self::Portrait4x5 => Some(PossibleValue::new("4:5")),
            Self::Landscape5x4 => Some(PossibleValue::new("5:4")),
            Self::Portrait9x16 => Some(PossibleValue::new("9:16")),
            Self::Landscape16x9 => Some(PossibleValue::new("16:9")),
            Self::Ultrawide21x9 => Some(PossibleValue::new("21:9")),
        }
    }
}

/// Reasoning budget the model spends before drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ThinkingLevel {
    Low,
    Medium,
    High,
}

impl ValueEnum for ThinkingLevel {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Low => Some(PossibleValue::new("low")),
            Self::Medium => Some(PossibleValue::new("medium")),
            Self::High => Some(PossibleValue::new("high")),
        }
    }
}

/// How output files are named when no explicit path is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NamingScheme {
    /// `bnn-YYYYMMDD-HHMMSS.ext`
    Timestamp,
    /// slug of the prompt plus time of day
    Prompt,
    /// `bnn-0001.ext`, next free number
    Sequential,
}

impl ValueEnum for NamingScheme {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Timestamp, Self::Prompt, Self::Sequential]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Timestamp => Some(PossibleValue::new("timestamp")),
            Self::Prompt => Some(PossibleValue::new("prompt")),
            Self::Sequential => Some(PossibleValue::new("sequential")),
        }
    }
}

impl_fromstr_for_value_enum!(Resolution, "invalid resolution");
impl_fromstr_for_value_enum!(AspectRatio, "invalid aspect ratio");
impl_fromstr_for_value_enum!(ThinkingLevel, "invalid thinking level");
impl_fromstr_for_value_enum!(NamingScheme, "invalid naming scheme");

/// A persisted configuration document that commands may mutate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigLayer {
    /// Per-installation document under the user config root
    Global,
    /// `.config/bnn.toml` of the enclosing project
    Project,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLayer::Global => write!(f, "global"),
            ConfigLayer::Project => write!(f, "project"),
        }
    }
}

/// Every source the resolver reads, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigSource {
    Defaults,
    Global,
    Project,
    Override,
    Environment,
}

impl From<ConfigLayer> for ConfigSource {
    fn from(layer: ConfigLayer) -> Self {
        match layer {
            ConfigLayer::Global => ConfigSource::Global,
            ConfigLayer::Project => ConfigSource::Project,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Defaults => write!(f, "defaults"),
            ConfigSource::Global => write!(f, "global"),
            ConfigSource::Project => write!(f, "project"),
            ConfigSource::Override => write!(f, "override"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}
