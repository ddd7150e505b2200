//! Profile records and their categorical attributes.

use crate::{
    signals::SignalVector,
    types::{DomainLabel, RegionId},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Declares a categorical column: its variants, wire labels, and parser.
macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            /// Exact label match; callers trim their input.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| s.to_string())
            }
        }
    };
}

categorical!(
    /// How regularly a person can get online.
    DigitalAccess {
        High       => "High",
        Regular    => "Regular",
        Limited    => "Limited",
        Occasional => "Occasional",
    }
);

categorical!(
    /// Local economic opportunity.
    OpportunityLevel {
        High     => "High",
        Moderate => "Moderate",
        Low      => "Low",
    }
);

categorical!(
    SettlementType {
        Urban     => "Urban",
        SemiUrban => "Semi-Urban",
        Rural     => "Rural",
    }
);

impl DigitalAccess {
    /// Limited or occasional access counts toward the digital divide.
    pub fn is_constrained(&self) -> bool {
        matches!(self, Self::Limited | Self::Occasional)
    }
}

/// One row of the profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub signals:           SignalVector,
    pub region:            RegionId,
    pub digital_access:    DigitalAccess,
    pub opportunity_level: OpportunityLevel,
    pub settlement:        SettlementType,
    pub domain:            DomainLabel,
    pub skill_score:       f64,
    /// Monthly skill values, oldest first. Absent for profiles without history.
    pub skill_history:     Option<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_labels_only() {
        assert_eq!("Limited".parse::<DigitalAccess>(), Ok(DigitalAccess::Limited));
        assert_eq!("Semi-Urban".parse::<SettlementType>(), Ok(SettlementType::SemiUrban));
        assert_eq!("Low".parse::<OpportunityLevel>(), Ok(OpportunityLevel::Low));
        assert!("limited".parse::<DigitalAccess>().is_err());
        assert!("LOW".parse::<OpportunityLevel>().is_err());
        assert!("rural".parse::<SettlementType>().is_err());
        assert!("Satellite".parse::<DigitalAccess>().is_err());
    }

    #[test]
    fn serializes_with_wire_labels() {
        let json = serde_json::to_string(&SettlementType::SemiUrban).unwrap();
        assert_eq!(json, "\"Semi-Urban\"");
    }

    #[test]
    fn constrained_access_tiers() {
        let constrained: Vec<_> = DigitalAccess::ALL
            .iter()
            .filter(|a| a.is_constrained())
            .collect();
        assert_eq!(constrained, vec![&DigitalAccess::Limited, &DigitalAccess::Occasional]);
    }
}
