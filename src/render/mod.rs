//! Retained-mode scene for the map, the bar chart and the legend.
//!
//! [`render`] rebuilds the whole [`Scene`] from the atlas and the current
//! [`AppState`]; nothing is patched in place. Call it again after every
//! [`AppState::update`].

mod projection;
mod svg;

pub use projection::{Mercator, centroid};
pub use svg::Svg;

use serde::Deserialize;
use tracing::debug;

use crate::aggregate::{CommunityRecord, SectorTotals};
use crate::atlas::Atlas;
use crate::color::{Bucket, Color, Colorizer, NO_DATA_LABEL};
use crate::modes::TravelMode;
use crate::selection::{AppState, ZoomTransform};

/// Bar pitch along the x-axis, in pixels per community.
const BAR_PITCH: f64 = 4.75;
const BAR_WIDTH: f64 = 5.0;
/// Horizontal offset of the plot area, leaving room for the y-axis.
const PLOT_LEFT: f64 = 52.0;
const Y_TICKS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Panel {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl Panel {
    pub fn outer_width(&self) -> f64 {
        self.width + self.margin.left + self.margin.right
    }

    pub fn outer_height(&self) -> f64 {
        self.height + self.margin.top + self.margin.bottom
    }
}

/// Sizes of the three panels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub map: Panel,
    pub plot: Panel,
    pub legend: Panel,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            map: Panel {
                width: 640.0,
                height: 768.0,
                margin: Margin::new(10.0, 50.0, 10.0, 50.0),
            },
            plot: Panel {
                width: 1120.0,
                height: 420.0,
                margin: Margin::new(5.0, 10.0, 100.0, 10.0),
            },
            legend: Panel {
                width: 180.0,
                height: 220.0,
                margin: Margin::new(0.0, 10.0, 50.0, 10.0),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapShape {
    pub comm_code: String,
    /// SVG path data in map-panel coordinates.
    pub path: String,
    pub label_at: Option<[f64; 2]>,
    pub fill: Color,
    pub highlighted: bool,
    pub tooltip: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub comm_code: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Color,
    pub highlighted: bool,
    pub tooltip: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarPlot {
    pub bars: Vec<Bar>,
    pub y_max: u64,
    /// Tick value and its y position.
    pub y_ticks: Vec<(u64, f64)>,
    pub x_label: String,
    pub y_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub no_data: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub heading: String,
    pub titles: [String; 3],
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub layout: Layout,
    pub mode: TravelMode,
    /// Applied to the community group only; labels and panels stay put.
    pub zoom: ZoomTransform,
    pub shapes: Vec<MapShape>,
    pub plot: BarPlot,
    pub legend: Legend,
}

impl Scene {
    pub fn shape(&self, comm_code: &str) -> Option<&MapShape> {
        self.shapes.iter().find(|s| s.comm_code == comm_code)
    }

    pub fn bar(&self, comm_code: &str) -> Option<&Bar> {
        self.plot.bars.iter().find(|b| b.comm_code == comm_code)
    }
}

/// Lines shown when hovering a community. Records with a sector get a
/// closing line with the whole sector's count.
pub fn tooltip(
    name: &str,
    record: Option<&CommunityRecord>,
    sectors: &SectorTotals,
    mode: TravelMode,
) -> Vec<String> {
    let Some(r) = record else {
        return vec![name.to_string(), "non-residential community".to_string()];
    };
    let mut lines = vec![
        name.to_string(),
        format!("{} people who live here", r.count(mode)),
        mode.commute_phrase(),
    ];
    if let (Some(sector), Some(totals)) = (&r.sector, sectors.for_record(r)) {
        lines.push(format!(
            "{} people who live in the {sector} sector {}",
            totals.get(mode),
            mode.commute_phrase()
        ));
    }
    lines
}

fn fill_for(
    code: &str,
    record: Option<&CommunityRecord>,
    atlas: &Atlas,
    state: &AppState,
    colorizer: &Colorizer,
) -> (Color, bool) {
    if state.selection.is_highlighted(code) {
        (colorizer.highlight_color(state.mode).clone(), true)
    } else {
        let totals = atlas.dataset().totals();
        (colorizer.bucket_color(state.mode, record, totals), false)
    }
}

fn path_data(rings: &[Vec<[f64; 2]>]) -> String {
    let mut d = String::new();
    for ring in rings {
        for (i, [x, y]) in ring.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            d.push_str(&format!("{cmd}{x:.2},{y:.2}"));
        }
        if !ring.is_empty() {
            d.push('Z');
        }
    }
    d
}

fn map_shapes(atlas: &Atlas, state: &AppState, colorizer: &Colorizer, layout: &Layout) -> Vec<MapShape> {
    let panel = layout.map;
    let extent = [[70.0, 10.0], [panel.width - 120.0, panel.height - 10.0]];
    let positions = atlas.boundaries().iter().flat_map(|b| b.positions());
    let Some(projection) = Mercator::fit_extent(extent, positions) else {
        return Vec::new();
    };

    atlas
        .boundaries()
        .iter()
        .map(|b| {
            let record = atlas.record(&b.comm_code);
            let (fill, highlighted) = fill_for(&b.comm_code, record, atlas, state, colorizer);
            let projected: Vec<Vec<Vec<[f64; 2]>>> = b
                .polygons
                .iter()
                .map(|poly| {
                    poly.iter()
                        .map(|ring| ring.iter().map(|p| projection.project(*p)).collect())
                        .collect()
                })
                .collect();
            let exteriors: Vec<Vec<[f64; 2]>> =
                projected.iter().filter_map(|poly| poly.first().cloned()).collect();
            let rings: Vec<Vec<[f64; 2]>> = projected.into_iter().flatten().collect();

            MapShape {
                comm_code: b.comm_code.clone(),
                path: path_data(&rings),
                label_at: centroid(&exteriors),
                fill,
                highlighted,
                tooltip: tooltip(&b.name, record, atlas.dataset().sectors(), state.mode),
            }
        })
        .collect()
}

fn bar_plot(atlas: &Atlas, state: &AppState, colorizer: &Colorizer, layout: &Layout) -> BarPlot {
    let mode = state.mode;
    let height = layout.plot.height;
    let records: Vec<&CommunityRecord> = atlas
        .dataset()
        .records()
        .iter()
        .filter(|r| r.count(mode) > 0)
        .collect();

    let max = records.iter().map(|r| r.count(mode)).max().unwrap_or(0);
    // Round up to the next multiple of 50, never to zero.
    let y_max = max.div_ceil(50).max(1) * 50;
    let y_of = |v: u64| height - v as f64 / y_max as f64 * height;

    let n = records.len();
    let step = if n == 0 {
        0.0
    } else {
        (n.saturating_sub(1)) as f64 * BAR_PITCH / n as f64
    };

    let bars = records
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            let (fill, highlighted) = fill_for(&r.comm_code, Some(r), atlas, state, colorizer);
            let y = y_of(r.count(mode));
            Bar {
                comm_code: r.comm_code.clone(),
                x: PLOT_LEFT + i as f64 * step,
                y,
                width: BAR_WIDTH,
                height: height - y,
                fill,
                highlighted,
                tooltip: tooltip(&r.name, Some(r), atlas.dataset().sectors(), mode),
            }
        })
        .collect();

    let y_ticks = (0..=Y_TICKS)
        .map(|k| {
            let v = y_max * k / Y_TICKS;
            (v, y_of(v))
        })
        .collect();

    BarPlot {
        bars,
        y_max,
        y_ticks,
        x_label: "Communities".to_string(),
        y_label: format!("Amount of people that {}", mode.commute_phrase()),
    }
}

fn legend(mode: TravelMode, colorizer: &Colorizer) -> Legend {
    let mut entries: Vec<LegendEntry> = match colorizer.palette(mode) {
        Some(palette) => Bucket::ALL
            .iter()
            .map(|b| LegendEntry {
                label: b.label().to_string(),
                color: palette[b.index()].clone(),
                no_data: false,
            })
            .collect(),
        None => Vec::new(),
    };
    entries.push(LegendEntry {
        label: NO_DATA_LABEL.to_string(),
        color: colorizer.no_data().clone(),
        no_data: true,
    });

    Legend {
        heading: "PERCENTAGE OF PEOPLE".to_string(),
        titles: mode.legend_titles().map(str::to_string),
        entries,
    }
}

/// Builds the complete scene for `state`.
pub fn render(atlas: &Atlas, state: &AppState, colorizer: &Colorizer, layout: &Layout) -> Scene {
    let scene = Scene {
        layout: *layout,
        mode: state.mode,
        zoom: state.zoom,
        shapes: map_shapes(atlas, state, colorizer, layout),
        plot: bar_plot(atlas, state, colorizer, layout),
        legend: legend(state.mode, colorizer),
    };
    debug!(
        mode = %state.mode,
        shapes = scene.shapes.len(),
        bars = scene.plot.bars.len(),
        "Scene rendered"
    );
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Dataset;
    use crate::loader::Boundary;
    use crate::selection::Message;
    use std::collections::BTreeMap;

    fn square(code: &str, lon: f64, lat: f64) -> Boundary {
        Boundary {
            comm_code: code.to_string(),
            name: format!("{code} NAME"),
            sector: None,
            polygons: vec![vec![vec![
                [lon, lat],
                [lon + 0.01, lat],
                [lon + 0.01, lat + 0.01],
                [lon, lat + 0.01],
                [lon, lat],
            ]]],
        }
    }

    fn record(code: &str, bicycle: u64) -> CommunityRecord {
        CommunityRecord {
            comm_code: code.to_string(),
            name: format!("{code} NAME"),
            sector: None,
            counts: BTreeMap::from([(TravelMode::Bicycle, bicycle)]),
            sum: bicycle,
        }
    }

    /// BEL holds 4 of 1000 cyclists (0.4%), ABB 45 (4.5%), ACA the rest,
    /// NOD has no row.
    fn atlas() -> Atlas {
        let dataset = Dataset::from_records(
            vec![record("BEL", 4), record("ABB", 45), record("ACA", 951)],
            vec![TravelMode::Bicycle],
        )
        .unwrap();
        Atlas::join(
            vec![
                square("BEL", -114.07, 51.03),
                square("ABB", -113.93, 51.06),
                square("ACA", -114.05, 50.97),
                square("NOD", -114.2, 51.1),
            ],
            dataset,
        )
        .unwrap()
    }

    #[test]
    fn test_shapes_take_bucket_colours() {
        let c = Colorizer::default();
        let scene = render(&atlas(), &AppState::default(), &c, &Layout::default());
        assert_eq!(scene.shape("BEL").unwrap().fill.as_str(), "#c6dbef");
        assert_eq!(scene.shape("ABB").unwrap().fill.as_str(), "#084594");
        assert_eq!(scene.shape("NOD").unwrap().fill, *c.no_data());
        assert_eq!(
            scene.shape("NOD").unwrap().tooltip,
            ["NOD NAME", "non-residential community"]
        );
    }

    #[test]
    fn test_click_highlights_map_and_bar() {
        let c = Colorizer::default();
        let atlas = atlas();
        let mut state = AppState::default();
        state.update(Message::Click("BEL".into()), &c).unwrap();

        let scene = render(&atlas, &state, &c, &Layout::default());
        let highlight = c.highlight_color(TravelMode::Bicycle);
        assert_eq!(scene.shape("BEL").unwrap().fill, *highlight);
        assert_eq!(scene.bar("BEL").unwrap().fill, *highlight);

        state.update(Message::Click("BEL".into()), &c).unwrap();
        let scene = render(&atlas, &state, &c, &Layout::default());
        assert_eq!(scene.shape("BEL").unwrap().fill.as_str(), "#c6dbef");
        assert!(!scene.bar("BEL").unwrap().highlighted);
    }

    #[test]
    fn test_bars_skip_zero_counts_and_round_axis() {
        let c = Colorizer::default();
        let mut state = AppState::default();
        let scene = render(&atlas(), &state, &c, &Layout::default());
        assert_eq!(scene.plot.bars.len(), 3);
        assert_eq!(scene.plot.y_max, 1000);
        assert!(scene.bar("NOD").is_none());
        let tallest = scene.bar("ACA").unwrap();
        assert!((tallest.height - 420.0 * 951.0 / 1000.0).abs() < 1e-9);

        state.update(Message::ChangeMode(TravelMode::Walk), &c).unwrap();
        let scene = render(&atlas(), &state, &c, &Layout::default());
        assert!(scene.plot.bars.is_empty());
        assert_eq!(scene.plot.y_max, 50);
        assert_eq!(scene.plot.y_label, "Amount of people that walk to work");
        // No walk column: every community falls back to no-data.
        assert!(scene.shapes.iter().all(|s| s.fill == *c.no_data()));
    }

    #[test]
    fn test_legend_lists_buckets_then_no_data() {
        let scene = render(&atlas(), &AppState::default(), &Colorizer::default(), &Layout::default());
        let labels: Vec<_> = scene.legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            ["<0.50%", "0.50-0.99%", "1.00-1.99%", "2.00-2.99%", "3.00-3.99%", ">4.00%", "non-residential"]
        );
        assert_eq!(scene.legend.titles[0], "CYCLING TO WORK");
    }

    #[test]
    fn test_tooltip_adds_sector_line() {
        let mut bel = record("BEL", 4);
        bel.sector = Some("CENTRE".to_string());
        let mut abb = record("ABB", 45);
        abb.sector = Some("CENTRE".to_string());
        let sectors = SectorTotals::from_records(&[bel.clone(), abb]).unwrap();

        assert_eq!(
            tooltip("BELTLINE", Some(&bel), &sectors, TravelMode::Bicycle),
            [
                "BELTLINE",
                "4 people who live here",
                "bicycle to work",
                "49 people who live in the CENTRE sector bicycle to work",
            ]
        );
        assert_eq!(
            tooltip("ACADIA", Some(&record("ACA", 1)), &sectors, TravelMode::Bicycle).len(),
            3
        );
    }

    #[test]
    fn test_scene_carries_zoom_until_reset() {
        let c = Colorizer::default();
        let atlas = atlas();
        let mut state = AppState::default();
        state
            .update(Message::Zoom(ZoomTransform::new(2.0, -30.0, 12.0)), &c)
            .unwrap();
        let zoomed = render(&atlas, &state, &c, &Layout::default());
        assert_eq!(zoomed.zoom, ZoomTransform::new(2.0, -30.0, 12.0));

        state.update(Message::Reset, &c).unwrap();
        let reset = render(&atlas, &state, &c, &Layout::default());
        assert!(reset.zoom.is_identity());
        // Zoom is a view transform; projected paths do not change with it.
        assert_eq!(zoomed.shapes, reset.shapes);
    }

    #[test]
    fn test_path_data_closes_rings() {
        let d = path_data(&[vec![[0.0, 0.0], [1.0, 0.5]]]);
        assert_eq!(d, "M0.00,0.00L1.00,0.50Z");
    }
}
