//! JSON overrides for palettes, highlight colours, layout and count parsing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::aggregate::CountPolicy;
use crate::color::{Color, Colorizer, Palette};
use crate::modes::TravelMode;
use crate::render::Layout;

/// Optional overrides for colours, layout and count parsing.
///
/// Stored as a JSON object on disk; every key may be omitted:
/// ```json
/// {
///   "count_policy": "zero",
///   "no_data": "#eeeeee",
///   "palettes": {
///     "carpool_dr": ["#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#de2d26", "#a50f15"]
///   },
///   "highlights": { "carpool_dr": "#911eb4" }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub count_policy: CountPolicy,
    pub no_data: Option<Color>,
    pub palettes: HashMap<TravelMode, Palette>,
    pub highlights: HashMap<TravelMode, Color>,
    pub layout: Layout,
}

impl MapConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid config '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// The default colorizer with this config's overrides applied.
    pub fn colorizer(&self) -> Colorizer {
        let mut colorizer = Colorizer::default();
        for (mode, palette) in &self.palettes {
            colorizer = colorizer.with_palette(*mode, palette.clone());
        }
        for (mode, color) in &self.highlights {
            colorizer = colorizer.with_highlight(*mode, color.clone());
        }
        if let Some(no_data) = &self.no_data {
            colorizer = colorizer.with_no_data(no_data.clone());
        }
        colorizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = MapConfig::from_json("{}").unwrap();
        assert_eq!(config.count_policy, CountPolicy::Strict);
        assert_eq!(config.layout, Layout::default());
        assert!(config.colorizer().has_palette(TravelMode::Bicycle));
        assert!(!config.colorizer().has_palette(TravelMode::CarpoolDr));
    }

    #[test]
    fn test_overrides_apply() {
        let config = MapConfig::from_json(
            r##"{
                "count_policy": "zero",
                "no_data": "#EEEEEE",
                "palettes": {"carpool_dr": ["#000001", "#000002", "#000003", "#000004", "#000005", "#000006"]},
                "highlights": {"walk": "#123456"}
            }"##,
        )
        .unwrap();
        let colorizer = config.colorizer();

        assert_eq!(config.count_policy, CountPolicy::Zero);
        assert_eq!(colorizer.no_data().as_str(), "#eeeeee");
        assert_eq!(colorizer.palette(TravelMode::CarpoolDr).unwrap()[5].as_str(), "#000006");
        assert_eq!(colorizer.highlight_color(TravelMode::Walk).as_str(), "#123456");
    }

    #[test]
    fn test_rejects_bad_colour_and_short_palette() {
        assert!(MapConfig::from_json(r#"{"no_data": "white"}"#).is_err());
        assert!(MapConfig::from_json(r##"{"palettes": {"walk": ["#000000"]}}"##).is_err());
        assert!(MapConfig::from_json(r#"{"palletes": {}}"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = MapConfig::load("/no/such/commute_map.json").unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
