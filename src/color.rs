//! Percentage buckets and the choropleth palettes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::aggregate::{CommunityRecord, ModeTotals};
use crate::error::ShareError;
use crate::modes::TravelMode;

/// A `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

#[derive(Debug, thiserror::Error)]
#[error("invalid colour '{0}', expected #rrggbb")]
pub struct InvalidColor(pub String);

impl Color {
    pub fn parse(s: &str) -> Result<Self, InvalidColor> {
        let hex = s.strip_prefix('#').ok_or_else(|| InvalidColor(s.to_string()))?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidColor(s.to_string()));
        }
        Ok(Self(format!("#{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// For compile-time palette constants that are known to be valid.
    fn literal(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the six share ranges, lowest first.
///
/// | Range        | Label        |
/// |--------------|--------------|
/// | [0, 0.5)     | `<0.50%`     |
/// | [0.5, 1.0)   | `0.50-0.99%` |
/// | [1.0, 2.0)   | `1.00-1.99%` |
/// | [2.0, 3.0)   | `2.00-2.99%` |
/// | [3.0, 4.0)   | `3.00-3.99%` |
/// | [4.0, ∞)     | `>4.00%`     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Bucket {
    UnderHalf,
    HalfToOne,
    OneToTwo,
    TwoToThree,
    ThreeToFour,
    FourPlus,
}

pub const NO_DATA_LABEL: &str = "non-residential";

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::UnderHalf,
        Bucket::HalfToOne,
        Bucket::OneToTwo,
        Bucket::TwoToThree,
        Bucket::ThreeToFour,
        Bucket::FourPlus,
    ];

    /// Total over `[0, ∞)`. Anything below zero lands in the lowest bucket.
    pub fn for_percent(pct: f64) -> Bucket {
        match pct {
            p if p >= 4.0 => Bucket::FourPlus,
            p if p >= 3.0 => Bucket::ThreeToFour,
            p if p >= 2.0 => Bucket::TwoToThree,
            p if p >= 1.0 => Bucket::OneToTwo,
            p if p >= 0.5 => Bucket::HalfToOne,
            _ => Bucket::UnderHalf,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Inclusive lower bound and exclusive upper bound (`None` = unbounded).
    pub fn range(self) -> (f64, Option<f64>) {
        match self {
            Bucket::UnderHalf => (0.0, Some(0.5)),
            Bucket::HalfToOne => (0.5, Some(1.0)),
            Bucket::OneToTwo => (1.0, Some(2.0)),
            Bucket::TwoToThree => (2.0, Some(3.0)),
            Bucket::ThreeToFour => (3.0, Some(4.0)),
            Bucket::FourPlus => (4.0, None),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::UnderHalf => "<0.50%",
            Bucket::HalfToOne => "0.50-0.99%",
            Bucket::OneToTwo => "1.00-1.99%",
            Bucket::TwoToThree => "2.00-2.99%",
            Bucket::ThreeToFour => "3.00-3.99%",
            Bucket::FourPlus => ">4.00%",
        }
    }
}

/// Six colours, one per [`Bucket`], lightest first.
pub type Palette = [Color; 6];

/// Share of the city-wide total for `mode` that lives in `record`, in percent.
pub fn share_percent(
    mode: TravelMode,
    record: &CommunityRecord,
    totals: &ModeTotals,
) -> Result<f64, ShareError> {
    let total = totals.get(mode);
    if total == 0 {
        return Err(ShareError::DivisionUndefined { mode });
    }
    Ok(100.0 * record.count(mode) as f64 / total as f64)
}

/// Maps community shares to fill colours.
#[derive(Debug, Clone)]
pub struct Colorizer {
    palettes: HashMap<TravelMode, Palette>,
    highlights: HashMap<TravelMode, Color>,
    no_data: Color,
    fallback_highlight: Color,
}

impl Default for Colorizer {
    fn default() -> Self {
        let palette = |hex: [&str; 6]| hex.map(Color::literal);
        let palettes = HashMap::from([
            (
                TravelMode::Bicycle,
                palette(["#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#084594"]),
            ),
            (
                TravelMode::Drovealone,
                palette(["#99d8c9", "#66c2a4", "#41ae76", "#238b45", "#006d2c", "#00441b"]),
            ),
            (
                TravelMode::Nowork,
                palette(["#bcbddc", "#9e9ac8", "#807dba", "#6a51a3", "#54278f", "#3f007d"]),
            ),
            (
                TravelMode::Transit,
                palette(["#fdae6b", "#fd8d3c", "#f16913", "#d94801", "#a63603", "#7f2704"]),
            ),
            (
                TravelMode::Walk,
                palette(["#fa9fb5", "#f768a1", "#dd3497", "#ae017e", "#7a0177", "#49006a"]),
            ),
            (
                TravelMode::WorkHome,
                palette(["#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15", "#67000d"]),
            ),
        ]);
        let highlights = HashMap::from([
            (TravelMode::Bicycle, Color::literal("#f58231")),
            (TravelMode::Drovealone, Color::literal("#e6194b")),
            (TravelMode::Nowork, Color::literal("#ffe119")),
            (TravelMode::Transit, Color::literal("#000075")),
            (TravelMode::Walk, Color::literal("#bfef45")),
            (TravelMode::WorkHome, Color::literal("#3cb44b")),
        ]);

        Self {
            palettes,
            highlights,
            no_data: Color::literal("#f7fbff"),
            fallback_highlight: Color::literal("#363636"),
        }
    }
}

impl Colorizer {
    pub fn with_palette(mut self, mode: TravelMode, palette: Palette) -> Self {
        self.palettes.insert(mode, palette);
        self
    }

    pub fn with_highlight(mut self, mode: TravelMode, color: Color) -> Self {
        self.highlights.insert(mode, color);
        self
    }

    pub fn with_no_data(mut self, color: Color) -> Self {
        self.no_data = color;
        self
    }

    pub fn palette(&self, mode: TravelMode) -> Option<&Palette> {
        self.palettes.get(&mode)
    }

    pub fn has_palette(&self, mode: TravelMode) -> bool {
        self.palettes.contains_key(&mode)
    }

    pub fn no_data(&self) -> &Color {
        &self.no_data
    }

    pub fn highlight_color(&self, mode: TravelMode) -> &Color {
        self.highlights.get(&mode).unwrap_or(&self.fallback_highlight)
    }

    /// Bucket for `record`, or `None` when the community should be drawn with
    /// the no-data colour.
    pub fn bucket(
        &self,
        mode: TravelMode,
        record: Option<&CommunityRecord>,
        totals: &ModeTotals,
    ) -> Option<Bucket> {
        let record = record?;
        share_percent(mode, record, totals)
            .ok()
            .map(Bucket::for_percent)
    }

    pub fn bucket_color(
        &self,
        mode: TravelMode,
        record: Option<&CommunityRecord>,
        totals: &ModeTotals,
    ) -> Color {
        match (self.palettes.get(&mode), self.bucket(mode, record, totals)) {
            (Some(palette), Some(bucket)) => palette[bucket.index()].clone(),
            _ => self.no_data.clone(),
        }
    }
}
