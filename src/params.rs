//! Aspect ratio and resolution enumerations and their provider encodings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BananaError;

/// Aspect ratios accepted by the generation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 2:3 portrait.
    #[serde(rename = "2:3")]
    Portrait2x3,
    /// 3:2 landscape.
    #[serde(rename = "3:2")]
    Landscape3x2,
    /// 3:4 portrait.
    #[serde(rename = "3:4")]
    Portrait3x4,
    /// 4:3 landscape.
    #[serde(rename = "4:3")]
    Landscape4x3,
    /// 4:5 portrait.
    #[serde(rename = "4:5")]
    Portrait4x5,
    /// 5:4 landscape.
    #[serde(rename = "5:4")]
    Landscape5x4,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// 16:9 landscape.
    #[serde(rename = "16:9")]
    Landscape16x9,
    /// 21:9 ultrawide.
    #[serde(rename = "21:9")]
    Ultrawide21x9,
}

const RATIOS: &[(AspectRatio, &str)] = &[
    (AspectRatio::Square, "1:1"),
    (AspectRatio::Portrait2x3, "2:3"),
    (AspectRatio::Landscape3x2, "3:2"),
    (AspectRatio::Portrait3x4, "3:4"),
    (AspectRatio::Landscape4x3, "4:3"),
    (AspectRatio::Portrait4x5, "4:5"),
    (AspectRatio::Landscape5x4, "5:4"),
    (AspectRatio::Portrait9x16, "9:16"),
    (AspectRatio::Landscape16x9, "16:9"),
    (AspectRatio::Ultrawide21x9, "21:9"),
];

impl AspectRatio {
    /// Every supported ratio, in display order.
    #[cfg(test)]
    pub fn all() -> impl Iterator<Item = Self> {
        RATIOS.iter().map(|&(ratio, _)| ratio)
    }

    /// The ratio as sent to the provider, e.g. `"16:9"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        RATIOS.iter().find(|&&(ratio, _)| ratio == self).map_or("1:1", |&(_, s)| s)
    }
}

impl FromStr for AspectRatio {
    type Err = BananaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RATIOS.iter().find(|&&(_, name)| name == s).map(|&(ratio, _)| ratio).ok_or_else(|| {
            let valid: Vec<&str> = RATIOS.iter().map(|&(_, name)| name).collect();
            BananaError::Validation(format!(
                "Unsupported aspect ratio '{s}'. Valid: {}",
                valid.join(", ")
            ))
        })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output resolution tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// About 1024px on the long side.
    #[serde(rename = "1K", alias = "1k")]
    OneK,
    /// About 2048px on the long side.
    #[default]
    #[serde(rename = "2K", alias = "2k")]
    TwoK,
    /// About 4096px on the long side.
    #[serde(rename = "4K", alias = "4k")]
    FourK,
}

impl Resolution {
    /// Every supported resolution.
    #[cfg(test)]
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::OneK, Self::TwoK, Self::FourK].into_iter()
    }

    /// The provider's `imageSize` token (always upper-case).
    #[must_use]
    pub fn as_provider_str(self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl FromStr for Resolution {
    type Err = BananaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(Self::OneK),
            "2K" => Ok(Self::TwoK),
            "4K" => Ok(Self::FourK),
            _ => Err(BananaError::Validation(format!(
                "Unsupported resolution '{s}'. Valid: 1K, 2K, 4K"
            ))),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_provider_str())
    }
}
