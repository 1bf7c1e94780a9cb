//! The commuting categories recognised in the mode-of-travel table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One column of the mode-of-travel table.
///
/// Every variant counts toward a community's `sum` and the global totals, but
/// only the variants listed in [`TravelMode::MAPPABLE`] have a choropleth
/// palette by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Bicycle,
    CarpoolDr,
    CarpoolPa,
    Drovealone,
    Motorcycle,
    Nowork,
    Transit,
    Walk,
    WorkHome,
}

impl TravelMode {
    pub const ALL: [TravelMode; 9] = [
        TravelMode::Bicycle,
        TravelMode::CarpoolDr,
        TravelMode::CarpoolPa,
        TravelMode::Drovealone,
        TravelMode::Motorcycle,
        TravelMode::Nowork,
        TravelMode::Transit,
        TravelMode::Walk,
        TravelMode::WorkHome,
    ];

    /// Modes offered in the mode picker, in dropdown order.
    pub const MAPPABLE: [TravelMode; 6] = [
        TravelMode::Bicycle,
        TravelMode::Drovealone,
        TravelMode::Transit,
        TravelMode::Walk,
        TravelMode::WorkHome,
        TravelMode::Nowork,
    ];

    /// Header name of the column in the CSV.
    pub fn column(self) -> &'static str {
        match self {
            TravelMode::Bicycle => "bicycle",
            TravelMode::CarpoolDr => "carpool_dr",
            TravelMode::CarpoolPa => "carpool_pa",
            TravelMode::Drovealone => "drovealone",
            TravelMode::Motorcycle => "motorcycle",
            TravelMode::Nowork => "nowork",
            TravelMode::Transit => "transit",
            TravelMode::Walk => "walk",
            TravelMode::WorkHome => "work_home",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.column() == column)
    }

    /// Resolves a dropdown label (e.g. `"Drive alone"`) to its mode.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::MAPPABLE
            .into_iter()
            .find(|m| m.label() == Some(label.trim()))
    }

    pub fn is_mappable(self) -> bool {
        Self::MAPPABLE.contains(&self)
    }

    /// Dropdown label, only for mappable modes.
    pub fn label(self) -> Option<&'static str> {
        match self {
            TravelMode::Bicycle => Some("Bicycle"),
            TravelMode::Drovealone => Some("Drive alone"),
            TravelMode::Transit => Some("Transit"),
            TravelMode::Walk => Some("Walk"),
            TravelMode::WorkHome => Some("Work from home"),
            TravelMode::Nowork => Some("Unemployed"),
            _ => None,
        }
    }

    /// Phrase used in tooltips and the y-axis label.
    pub fn phrase(self) -> &'static str {
        match self {
            TravelMode::Bicycle => "bicycle",
            TravelMode::CarpoolDr => "carpool as driver",
            TravelMode::CarpoolPa => "carpool as passenger",
            TravelMode::Drovealone => "drive alone",
            TravelMode::Motorcycle => "ride a motorcycle",
            TravelMode::Nowork => "are unemployed",
            TravelMode::Transit => "transit",
            TravelMode::Walk => "walk",
            TravelMode::WorkHome => "stay at home",
        }
    }

    /// Phrase followed by " to work", except for `nowork`.
    pub fn commute_phrase(self) -> String {
        match self {
            TravelMode::Nowork => self.phrase().to_string(),
            _ => format!("{} to work", self.phrase()),
        }
    }

    /// The three lines printed under "PERCENTAGE OF PEOPLE" in the legend.
    pub fn legend_titles(self) -> [&'static str; 3] {
        match self {
            TravelMode::Bicycle => [
                "CYCLING TO WORK",
                "(OF TOTAL THAT CYCLE",
                "TO WORK IN CALGARY)",
            ],
            TravelMode::Drovealone => [
                "DRIVING ALONE TO WORK",
                "(OF TOTAL THAT DRIVE ALONE",
                "TO WORK IN CALGARY)",
            ],
            TravelMode::Transit => [
                "TAKING TRANSIT TO WORK",
                "(OF TOTAL THAT TRANSIT",
                "TO WORK IN CALGARY)",
            ],
            TravelMode::Walk => [
                "WALKING TO WORK",
                "(OF TOTAL THAT WALK",
                "TO WORK IN CALGARY)",
            ],
            TravelMode::WorkHome => [
                "WORKING FROM HOME",
                "(OF TOTAL THAT WORK FROM",
                "HOME IN CALGARY)",
            ],
            TravelMode::Nowork => [
                "THAT ARE UNEMPLOYED",
                "(OF TOTAL UNEMPLOYED",
                "IN CALGARY)",
            ],
            TravelMode::CarpoolDr => [
                "CARPOOLING TO WORK",
                "(OF TOTAL THAT DRIVE A CARPOOL",
                "TO WORK IN CALGARY)",
            ],
            TravelMode::CarpoolPa => [
                "CARPOOLING TO WORK",
                "(OF TOTAL CARPOOL PASSENGERS",
                "IN CALGARY)",
            ],
            TravelMode::Motorcycle => [
                "RIDING TO WORK",
                "(OF TOTAL THAT RIDE A MOTORCYCLE",
                "TO WORK IN CALGARY)",
            ],
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown mode of travel '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for TravelMode {
    type Err = UnknownMode;

    /// Accepts either the column name or the dropdown label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_column(s.trim())
            .or_else(|| Self::from_label(s))
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_round_trip() {
        for mode in TravelMode::ALL {
            assert_eq!(TravelMode::from_column(mode.column()), Some(mode));
        }
        assert_eq!(TravelMode::from_column("comm_code"), None);
    }

    #[test]
    fn test_from_str_accepts_labels() {
        assert_eq!("Drive alone".parse::<TravelMode>().unwrap(), TravelMode::Drovealone);
        assert_eq!("work_home".parse::<TravelMode>().unwrap(), TravelMode::WorkHome);
        assert!("hovercraft".parse::<TravelMode>().is_err());
    }

    #[test]
    fn test_carpool_is_not_mappable() {
        assert!(!TravelMode::CarpoolDr.is_mappable());
        assert!(TravelMode::CarpoolDr.label().is_none());
        assert!(TravelMode::Walk.is_mappable());
    }

    #[test]
    fn test_commute_phrase() {
        assert_eq!(TravelMode::Walk.commute_phrase(), "walk to work");
        assert_eq!(TravelMode::Nowork.commute_phrase(), "are unemployed");
    }
}
