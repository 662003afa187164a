use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::config::HexColor;

/// Assistant persona. The set is closed: every mode has a prompt, a label and
/// an accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    RealEstate,
    Homework,
    Business,
    Image,
    Creative,
    Artist,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::RealEstate,
        Mode::Homework,
        Mode::Business,
        Mode::Image,
        Mode::Creative,
        Mode::Artist,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::RealEstate => "real-estate",
            Self::Homework => "homework",
            Self::Business => "business",
            Self::Image => "image",
            Self::Creative => "creative",
            Self::Artist => "artist",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::RealEstate => "Real Estate",
            Self::Homework => "Homework",
            Self::Business => "Business",
            Self::Image => "Image",
            Self::Creative => "Creative",
            Self::Artist => "Artist",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::RealEstate => "Property analysis & market insights",
            Self::Homework => "Academic help & explanations",
            Self::Business => "Strategy & analytics",
            Self::Image => "Visual analysis & generation",
            Self::Creative => "Writing & ideation",
            Self::Artist => "Art creation & critique",
        }
    }

    pub fn accent(self) -> HexColor {
        let (r, g, b) = match self {
            Self::RealEstate => (34, 197, 94),
            Self::Homework => (59, 130, 246),
            Self::Business => (245, 158, 11),
            Self::Image => (236, 72, 153),
            Self::Creative => (168, 85, 247),
            Self::Artist => (239, 68, 68),
        };
        HexColor { r, g, b }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.tag() == value)
            .ok_or_else(|| format!("unknown mode '{value}'"))
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
