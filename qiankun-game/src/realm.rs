//! Progression vocabulary: realms and the stages inside them.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level progression tier. Only the first realm is currently reachable;
/// the rest exist as data so that enabling them later is a table change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Realm {
    #[default]
    QiCondensation,
    FoundationEstablishment,
    CoreFormation,
    NascentSoul,
    SoulTransformation,
    VoidRefinement,
    BodyIntegration,
    GreatAscension,
}

impl Realm {
    /// All realms in ascending order.
    pub const ORDER: [Self; 8] = [
        Self::QiCondensation,
        Self::FoundationEstablishment,
        Self::CoreFormation,
        Self::NascentSoul,
        Self::SoulTransformation,
        Self::VoidRefinement,
        Self::BodyIntegration,
        Self::GreatAscension,
    ];

    /// Position within [`Self::ORDER`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-facing realm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::QiCondensation => "Qi Condensation",
            Self::FoundationEstablishment => "Foundation Establishment",
            Self::CoreFormation => "Core Formation",
            Self::NascentSoul => "Nascent Soul",
            Self::SoulTransformation => "Soul Transformation",
            Self::VoidRefinement => "Void Refinement",
            Self::BodyIntegration => "Body Integration",
            Self::GreatAscension => "Great Ascension",
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered sub-level within a realm, advanced by crossing an experience
/// threshold. `Peak` is absorbing while realm breakthroughs stay disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Initial,
    Early,
    Middle,
    Late,
    Peak,
}

impl Stage {
    /// All stages in ascending order.
    pub const ORDER: [Self; 5] = [
        Self::Initial,
        Self::Early,
        Self::Middle,
        Self::Late,
        Self::Peak,
    ];

    /// Position within [`Self::ORDER`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The next stage up, or `None` at the peak.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Initial => Some(Self::Early),
            Self::Early => Some(Self::Middle),
            Self::Middle => Some(Self::Late),
            Self::Late => Some(Self::Peak),
            Self::Peak => None,
        }
    }

    /// Whether this is the final, absorbing stage of a realm.
    #[must_use]
    pub const fn is_peak(self) -> bool {
        matches!(self, Self::Peak)
    }

    /// Human-facing stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::Early => "Early",
            Self::Middle => "Middle",
            Self::Late => "Late",
            Self::Peak => "Peak",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_walks_to_peak_and_stops() {
        let mut stage = Stage::Initial;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            visited.push(stage);
        }
        assert_eq!(visited, Stage::ORDER);
        assert!(stage.is_peak());
        assert!(stage.next().is_none());
    }

    #[test]
    fn indices_match_order_position() {
        for (position, realm) in Realm::ORDER.iter().enumerate() {
            assert_eq!(realm.index(), position);
        }
        for (position, stage) in Stage::ORDER.iter().enumerate() {
            assert_eq!(stage.index(), position);
        }
    }

    #[test]
    fn serde_ids_are_snake_case() {
        let json = serde_json::to_string(&Realm::QiCondensation).unwrap();
        assert_eq!(json, "\"qi_condensation\"");
        let stage: Stage = serde_json::from_str("\"peak\"").unwrap();
        assert_eq!(stage, Stage::Peak);
    }

    #[test]
    fn display_uses_human_names() {
        assert_eq!(Realm::QiCondensation.to_string(), "Qi Condensation");
        assert_eq!(Stage::Initial.to_string(), "Initial");
    }
}
