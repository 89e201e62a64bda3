//! SVG markup for the two chart types.
//!
//! Markup is built as a string, the same way the results snapshot was, and
//! handed to usvg for rasterisation. Geometry is computed here so the raster
//! step never needs to know about chart semantics.

use std::f64::consts::PI;
use std::fmt::Write;

use tracing::warn;

use crate::core::config::Rgb;
use crate::core::format::format_number;

/// Bar fills, cycled per category.
const PALETTE: [&str; 10] = [
    "#1F6FB2", "#F28E2B", "#59A14F", "#E15759", "#76B7B2", "#EDC948", "#B07AA1", "#FF9DA7",
    "#9C755F", "#BAB0AC",
];

const TEXT: &str = "#1D2330";
const GRID: &str = "#D5DAE1";

#[derive(Debug, Clone)]
pub(crate) struct Canvas {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub accent: Rgb,
}

impl Canvas {
    fn open(&self, title: &str) -> String {
        let (w, h) = (self.width, self.height);
        let family = escape(&self.font_family);
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}' viewBox='0 0 {w} {h}' \
             font-family='{family}'>\n  <rect width='{w}' height='{h}' fill='#FFFFFF'/>\n  \
             <text x='{x}' y='36' fill='{TEXT}' font-size='22' font-weight='700' text-anchor='middle'>{title}</text>\n",
            x = f64::from(w) / 2.0,
            title = escape(title),
        );
        svg
    }
}

/// Bars start at zero; negative values are drawn as empty bars and reported.
pub(crate) fn bar_chart(
    canvas: &Canvas,
    title: &str,
    categories: &[(String, f64)],
    warnings: &mut Vec<String>,
) -> String {
    let mut svg = canvas.open(title);
    let (left, right, top, bottom) = (72.0, 24.0, 64.0, 120.0);
    let plot_w = (f64::from(canvas.width) - left - right).max(1.0);
    let plot_h = (f64::from(canvas.height) - top - bottom).max(1.0);
    let base_y = top + plot_h;

    let values: Vec<f64> = categories
        .iter()
        .map(|(label, value)| {
            if value.is_finite() && *value >= 0.0 {
                *value
            } else {
                let message = format!("{label}: {value} drawn as 0 on the bar chart");
                warn!(chart = "bar", %label, value, "value below bar baseline");
                warnings.push(message);
                0.0
            }
        })
        .collect();

    let y_max = nice_ceiling(values.iter().copied().fold(0.0, f64::max));

    const TICKS: usize = 5;
    for tick in 0..=TICKS {
        let value = y_max * tick as f64 / TICKS as f64;
        let y = base_y - plot_h * tick as f64 / TICKS as f64;
        let _ = writeln!(
            svg,
            "  <line x1='{left}' y1='{y:.2}' x2='{x2:.2}' y2='{y:.2}' stroke='{GRID}' stroke-width='1'/>\n  \
             <text x='{lx}' y='{ty:.2}' fill='{TEXT}' font-size='13' text-anchor='end'>{label}</text>",
            x2 = left + plot_w,
            lx = left - 8.0,
            ty = y + 4.0,
            label = format_number((value * 100.0).round() / 100.0),
        );
    }

    let slot = if categories.is_empty() {
        plot_w
    } else {
        plot_w / categories.len() as f64
    };

    for (idx, ((label, raw), value)) in categories.iter().zip(&values).enumerate() {
        let bar_h = plot_h * value / y_max;
        let x = left + slot * idx as f64 + slot * 0.2;
        let center = left + slot * idx as f64 + slot / 2.0;
        let _ = writeln!(
            svg,
            "  <rect x='{x:.2}' y='{y:.2}' width='{w:.2}' height='{bar_h:.2}' fill='{fill}'/>\n  \
             <text x='{center:.2}' y='{vy:.2}' fill='{TEXT}' font-size='13' text-anchor='middle'>{value_label}</text>\n  \
             <text x='{center:.2}' y='{ly:.2}' fill='{TEXT}' font-size='13' text-anchor='end' \
             transform='rotate(-35 {center:.2} {ly:.2})'>{label}</text>",
            y = base_y - bar_h,
            w = slot * 0.6,
            fill = PALETTE[idx % PALETTE.len()],
            vy = base_y - bar_h - 6.0,
            value_label = escape(&format_number(*raw)),
            ly = base_y + 18.0,
            label = escape(label),
        );
    }

    let _ = writeln!(
        svg,
        "  <line x1='{left}' y1='{base_y:.2}' x2='{x2:.2}' y2='{base_y:.2}' stroke='{TEXT}' stroke-width='1.5'/>\n</svg>",
        x2 = left + plot_w,
    );
    svg
}

/// One spoke per axis. Values are clamped into `range` so the scale never
/// stretches; fewer than three axes still draw (as a point or a line).
pub(crate) fn radar_chart(
    canvas: &Canvas,
    title: &str,
    axes: &[(String, f64)],
    (min, max): (f64, f64),
    warnings: &mut Vec<String>,
) -> String {
    let mut svg = canvas.open(title);
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let (cx, cy) = (w / 2.0, (h + 48.0) / 2.0);
    let radius = ((w.min(h - 48.0)) / 2.0 - 70.0).max(10.0);
    let span = (max - min).max(f64::EPSILON);
    let count = axes.len().max(1);

    let angle = |idx: usize| -PI / 2.0 + 2.0 * PI * idx as f64 / count as f64;
    let point = |idx: usize, r: f64| (cx + r * angle(idx).cos(), cy + r * angle(idx).sin());

    const RINGS: usize = 5;
    for ring in 1..=RINGS {
        let r = radius * ring as f64 / RINGS as f64;
        if axes.len() >= 3 {
            let points = (0..axes.len())
                .map(|idx| {
                    let (x, y) = point(idx, r);
                    format!("{x:.2},{y:.2}")
                })
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(svg, "  <polygon points='{points}' fill='none' stroke='{GRID}' stroke-width='1'/>");
        } else {
            let _ = writeln!(
                svg,
                "  <circle cx='{cx:.2}' cy='{cy:.2}' r='{r:.2}' fill='none' stroke='{GRID}' stroke-width='1'/>"
            );
        }
        let tick = min + span * ring as f64 / RINGS as f64;
        let _ = writeln!(
            svg,
            "  <text x='{x:.2}' y='{y:.2}' fill='#6B7380' font-size='11'>{label}</text>",
            x = cx + 4.0,
            y = cy - r - 2.0,
            label = format_number(tick.round()),
        );
    }

    let mut vertices = Vec::with_capacity(axes.len());
    for (idx, (label, value)) in axes.iter().enumerate() {
        let clamped = if value.is_finite() { value.clamp(min, max) } else { min };
        if clamped != *value {
            warn!(chart = "radar", %label, value, clamped, "value outside radial range");
            warnings.push(format!("{label}: {value} clamped to [{min}, {max}]"));
        }

        let (ax, ay) = point(idx, radius);
        let _ = writeln!(
            svg,
            "  <line x1='{cx:.2}' y1='{cy:.2}' x2='{ax:.2}' y2='{ay:.2}' stroke='{GRID}' stroke-width='1'/>"
        );

        let (lx, ly) = point(idx, radius + 16.0);
        let anchor = match angle(idx).cos() {
            c if c > 0.2 => "start",
            c if c < -0.2 => "end",
            _ => "middle",
        };
        let _ = writeln!(
            svg,
            "  <text x='{lx:.2}' y='{ty:.2}' fill='{TEXT}' font-size='13' text-anchor='{anchor}'>{label}</text>",
            ty = ly + 4.0,
            label = escape(label),
        );

        vertices.push(point(idx, radius * (clamped - min) / span));
    }

    let accent = canvas.accent.to_hex();
    let points = vertices
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ");
    if vertices.len() >= 2 {
        let _ = writeln!(
            svg,
            "  <polygon points='{points}' fill='{accent}' fill-opacity='0.35' stroke='{accent}' stroke-width='2'/>"
        );
    }
    for (x, y) in &vertices {
        let _ = writeln!(svg, "  <circle cx='{x:.2}' cy='{y:.2}' r='4' fill='{accent}'/>");
    }

    svg.push_str("</svg>\n");
    svg
}

/// Smallest of 1, 2, 2.5, 5 × 10ⁿ that is ≥ `value`.
fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(value.log10().floor());
    let normalized = value / magnitude;
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|step| normalized <= *step + 1e-9)
        .unwrap_or(10.0);
    step * magnitude
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
