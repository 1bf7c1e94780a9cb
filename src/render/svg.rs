//! SVG serialisation of a [`Scene`].
//!
//! The map sits top-left, the legend to its right and the bar chart below
//! both. Tooltips are emitted as `<title>` children so hover text works in any
//! SVG viewer.

use std::fmt::{self, Write};

use super::{Bar, BarPlot, Legend, MapShape, Scene};

/// Display adapter that writes a scene as a standalone SVG document.
pub struct Svg<'a>(&'a Scene);

impl Scene {
    pub fn svg(&self) -> Svg<'_> {
        Svg(self)
    }

    pub fn to_svg(&self) -> String {
        self.svg().to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn title(f: &mut impl Write, lines: &[String]) -> fmt::Result {
    write!(f, "<title>{}</title>", escape(&lines.join("\n")))
}

fn write_shape(f: &mut impl Write, shape: &MapShape) -> fmt::Result {
    let code = escape(&shape.comm_code);
    write!(f, r#"<g class="community" fill="{}">"#, shape.fill)?;
    write!(
        f,
        r#"<path id="MAPID{code}" class="area{}" d="{}" stroke="white" stroke-width="0.5">"#,
        if shape.highlighted { " selected" } else { "" },
        shape.path
    )?;
    title(f, &shape.tooltip)?;
    f.write_str("</path>")?;
    if let Some([x, y]) = shape.label_at {
        write!(
            f,
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" class="text-label" font-weight="bold" font-size="6" fill="black">{code}</text>"#
        )?;
    }
    f.write_str("</g>\n")
}

fn write_bar(f: &mut impl Write, bar: &Bar) -> fmt::Result {
    write!(
        f,
        r#"<rect id="BARID{}" class="bar{}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}">"#,
        escape(&bar.comm_code),
        if bar.highlighted { " selected" } else { "" },
        bar.x,
        bar.y,
        bar.width,
        bar.height,
        bar.fill
    )?;
    title(f, &bar.tooltip)?;
    f.write_str("</rect>\n")
}

fn write_plot(f: &mut impl Write, plot: &BarPlot, width: f64, height: f64) -> fmt::Result {
    let axis_x = 50.0;
    writeln!(
        f,
        r##"<line class="y-axis" x1="{axis_x}" y1="0" x2="{axis_x}" y2="{height}" stroke="#363636"/>"##
    )?;
    for (value, y) in &plot.y_ticks {
        writeln!(
            f,
            r##"<g class="tick"><line x1="{}" y1="{y:.2}" x2="{axis_x}" y2="{y:.2}" stroke="#363636"/><text x="{}" y="{y:.2}" dy="0.32em" text-anchor="end" font-size="10">{value}</text></g>"##,
            axis_x - 6.0,
            axis_x - 9.0,
        )?;
    }
    writeln!(
        f,
        r##"<line class="x-axis" x1="{axis_x}" y1="{height}" x2="{width}" y2="{height}" stroke="#363636"/>"##
    )?;

    for (i, bar) in plot.bars.iter().enumerate() {
        write_bar(f, bar)?;
        // Stagger the rotated labels over three rows so neighbours stay legible.
        let stagger = (i % 3) as f64;
        let x = bar.x + bar.width / 2.0;
        writeln!(
            f,
            r##"<line x1="{x:.2}" x2="{x:.2}" y1="{height}" y2="{:.2}" stroke-width="0.4" stroke="#363636"/><text transform="translate({x:.2},{:.2}) rotate(-90)" font-size="8" text-anchor="end">{}</text>"##,
            height + 10.0 + 18.0 * stagger,
            height + 20.0 * (stagger + 1.0),
            escape(&bar.comm_code)
        )?;
    }

    writeln!(
        f,
        r#"<text class="label" x="{:.2}" y="{:.2}" text-anchor="end">{}</text>"#,
        width / 2.0,
        height + 95.0,
        escape(&plot.x_label)
    )?;
    writeln!(
        f,
        r#"<text class="label" transform="translate(0,100) rotate(-90)" dy=".71em" text-anchor="end">{}</text>"#,
        escape(&plot.y_label)
    )
}

fn write_legend(f: &mut impl Write, legend: &Legend) -> fmt::Result {
    let heading = std::iter::once(&legend.heading).chain(legend.titles.iter());
    for (i, line) in heading.enumerate() {
        writeln!(
            f,
            r#"<text x="0" y="{}" dy="0.32em" class="legend-text" font-size="11">{}</text>"#,
            10 + 14 * i,
            escape(line)
        )?;
    }

    f.write_str(r#"<g font-family="sans-serif" font-size="10" transform="translate(0, 32)">"#)?;
    for (i, entry) in legend.entries.iter().enumerate() {
        let y = 20 * i;
        let (rect_y, rect_h, stroke, stroke_w, text_y) = if entry.no_data {
            (50, 16, "black", 0.5, 59)
        } else {
            (31, 21, "white", 0.0, 51)
        };
        let prefix = if entry.no_data { "  " } else { "-  " };
        writeln!(
            f,
            r#"<g transform="translate(0,{y})"><rect x="0" y="{rect_y}" width="16" height="{rect_h}" stroke="{stroke}" stroke-width="{stroke_w}" fill="{}"/><text x="20" y="{text_y}" dy="0.32em" class="legend-value-text" xml:space="preserve">{prefix}{}</text></g>"#,
            entry.color,
            escape(&entry.label)
        )?;
    }
    f.write_str("</g>\n")
}

impl fmt::Display for Svg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scene = self.0;
        let layout = &scene.layout;
        let width = (layout.map.outer_width() + layout.legend.outer_width()).max(layout.plot.outer_width());
        let top = layout.map.outer_height().max(layout.legend.outer_height());
        let height = top + layout.plot.outer_height();

        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" data-mode="{}">"#,
            scene.mode
        )?;

        writeln!(
            f,
            r#"<g id="map-svg" transform="translate({},{})">"#,
            layout.map.margin.left, layout.map.margin.top
        )?;
        writeln!(f, r#"<g class="communities" transform="{}">"#, scene.zoom)?;
        for shape in &scene.shapes {
            write_shape(f, shape)?;
        }
        f.write_str("</g>\n</g>\n")?;

        writeln!(
            f,
            r#"<g id="legend-svg" transform="translate({},{})">"#,
            layout.map.outer_width() + layout.legend.margin.left,
            layout.legend.margin.top
        )?;
        write_legend(f, &scene.legend)?;
        f.write_str("</g>\n")?;

        writeln!(
            f,
            r#"<g id="plot-svg" class="graphPlot" transform="translate({},{})">"#,
            layout.plot.margin.left,
            top + layout.plot.margin.top
        )?;
        write_plot(f, &scene.plot, layout.plot.width, layout.plot.height)?;
        f.write_str("</g>\n")?;

        f.write_str("</svg>\n")
    }
}
