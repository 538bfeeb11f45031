use serde::{Deserialize, Serialize};

/// Reserved record field holding the training label. Never used as a feature.
pub const LABEL_FIELD: &str = "status";

/// Binary survival status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[display("alive")]
    Alive,
    #[display("dead")]
    Dead,
}

impl Label {
    pub const ALL: [Self; 2] = [Self::Alive, Self::Dead];

    /// Parses the exact wire form (`"alive"` or `"dead"`). Matching is case-sensitive.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "alive" => Some(Self::Alive),
            "dead" => Some(Self::Dead),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Dead => "dead",
        }
    }

    /// Resolves a vote share into a label. An even split resolves to [`Label::Dead`].
    #[must_use]
    pub fn from_alive_share(alive_share: f64) -> Self {
        if alive_share > 0.5 {
            Self::Alive
        } else {
            Self::Dead
        }
    }
}
