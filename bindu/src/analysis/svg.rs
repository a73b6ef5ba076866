//! SVG charts for query summaries.
//!
//! Two fixed layouts: a heatmap for density grids and a vertical bar chart
//! for everything else. Empty results render a placeholder message.

use std::fmt::{self, Write};

use super::summary::{DensityGrid, Summary};

/// Chart layout in pixels
#[derive(Clone, Debug)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub bar_color: &'static str,
    /// Heatmap color for the lowest count
    pub low_color: (u8, u8, u8),
    /// Heatmap color for the highest count
    pub high_color: (u8, u8, u8),
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            padding: 60.0,
            bar_color: "#2222AA",
            low_color: (0x44, 0x01, 0x54),
            high_color: (0xFD, 0xE7, 0x25),
        }
    }
}

/// Render a summary with the chart its shape calls for
pub fn render_summary<W: Write>(out: &mut W, config: &ChartConfig, title: &str, summary: &Summary) -> fmt::Result {
    match summary {
        Summary::Empty { .. } => render_empty(out, config, title),
        Summary::Density(grid) => render_heatmap(out, config, title, grid),
        other => {
            let (axis, bars) = other.bars();
            render_bars(out, config, title, &axis, &bars)
        }
    }
}

/// Placeholder chart for results without rows
pub fn render_empty<W: Write>(out: &mut W, config: &ChartConfig, title: &str) -> fmt::Result {
    header(out, config, title)?;
    writeln!(
        out,
        r##"  <text x="{:.0}" y="{:.0}" font-family="sans-serif" font-size="14" text-anchor="middle" fill="#666">No data available</text>"##,
        config.width / 2.0,
        config.height / 2.0
    )?;
    writeln!(out, "</svg>")
}

/// Heatmap with x buckets on the vertical axis (lowest at the bottom) and y buckets horizontally
pub fn render_heatmap<W: Write>(out: &mut W, config: &ChartConfig, title: &str, grid: &DensityGrid) -> fmt::Result {
    header(out, config, title)?;

    let plot_w = config.width - 2.0 * config.padding;
    let plot_h = config.height - 2.0 * config.padding;
    let cols = grid.y_buckets.len().max(1) as f64;
    let rows = grid.x_buckets.len().max(1) as f64;
    let cell_w = plot_w / cols;
    let cell_h = plot_h / rows;
    let max = grid.max_count().max(1) as f64;

    writeln!(
        out,
        r#"  <g id="heatmap" transform="translate({:.0}, {:.0})">"#,
        config.padding, config.padding
    )?;
    for (i, row) in grid.counts.iter().enumerate() {
        // Flip so the first x bucket sits at the bottom
        let py = plot_h - (i as f64 + 1.0) * cell_h;
        for (j, &n) in row.iter().enumerate() {
            let px = j as f64 * cell_w;
            writeln!(
                out,
                r#"    <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}</title></rect>"#,
                px,
                py,
                cell_w,
                cell_h,
                lerp_color(config.low_color, config.high_color, n as f64 / max),
                n
            )?;
        }
    }
    for (j, y) in grid.y_buckets.iter().enumerate() {
        writeln!(
            out,
            r##"    <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="middle" fill="#333">{}</text>"##,
            (j as f64 + 0.5) * cell_w,
            plot_h + 14.0,
            y
        )?;
    }
    for (i, x) in grid.x_buckets.iter().enumerate() {
        writeln!(
            out,
            r##"    <text x="-6" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="end" fill="#333">{}</text>"##,
            plot_h - (i as f64 + 0.5) * cell_h + 3.0,
            x
        )?;
    }
    writeln!(out, "  </g>")?;

    axis_labels(out, config, "Y Bucket (m)", "X Bucket (m)")?;
    writeln!(out, "</svg>")
}

/// Vertical bars scaled to the largest magnitude
pub fn render_bars<W: Write>(
    out: &mut W,
    config: &ChartConfig,
    title: &str,
    value_axis: &str,
    bars: &[(String, f64)],
) -> fmt::Result {
    if bars.is_empty() {
        return render_empty(out, config, title);
    }
    header(out, config, title)?;

    let plot_w = config.width - 2.0 * config.padding;
    let plot_h = config.height - 2.0 * config.padding;
    let peak = bars
        .iter()
        .map(|(_, v)| v.abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let slot = plot_w / bars.len() as f64;
    let bar_w = slot * 0.8;

    writeln!(
        out,
        r#"  <g id="bars" transform="translate({:.0}, {:.0})">"#,
        config.padding, config.padding
    )?;
    writeln!(
        out,
        r##"    <line x1="0" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#333" stroke-width="1"/>"##,
        plot_h, plot_w, plot_h
    )?;
    for (k, (label, value)) in bars.iter().enumerate() {
        let h = value.abs() / peak * plot_h;
        let x = k as f64 * slot + (slot - bar_w) / 2.0;
        writeln!(
            out,
            r#"    <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"#,
            x,
            plot_h - h,
            bar_w,
            h,
            config.bar_color,
            escape(label),
            value
        )?;
        writeln!(
            out,
            r##"    <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="middle" fill="#333">{}</text>"##,
            x + bar_w / 2.0,
            plot_h + 14.0,
            escape(label)
        )?;
    }
    writeln!(out, "  </g>")?;

    axis_labels(out, config, "", value_axis)?;
    writeln!(out, "</svg>")
}

fn header<W: Write>(out: &mut W, config: &ChartConfig, title: &str) -> fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
        config.width, config.height, config.width, config.height
    )?;
    writeln!(out, r##"  <rect width="100%" height="100%" fill="#F8F8F8"/>"##)?;
    writeln!(
        out,
        r##"  <text x="{:.0}" y="24" font-family="sans-serif" font-size="16" font-weight="bold" text-anchor="middle" fill="#333">{}</text>"##,
        config.width / 2.0,
        escape(title)
    )
}

fn axis_labels<W: Write>(out: &mut W, config: &ChartConfig, horizontal: &str, vertical: &str) -> fmt::Result {
    if !horizontal.is_empty() {
        writeln!(
            out,
            r##"  <text x="{:.0}" y="{:.0}" font-family="sans-serif" font-size="12" text-anchor="middle" fill="#333">{}</text>"##,
            config.width / 2.0,
            config.height - 12.0,
            escape(horizontal)
        )?;
    }
    if !vertical.is_empty() {
        let cy = config.height / 2.0;
        writeln!(
            out,
            r##"  <text x="16" y="{:.0}" font-family="sans-serif" font-size="12" text-anchor="middle" fill="#333" transform="rotate(-90 16 {:.0})">{}</text>"##,
            cy,
            cy,
            escape(vertical)
        )?;
    }
    Ok(())
}

fn lerp_color(low: (u8, u8, u8), high: (u8, u8, u8), t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    format!("#{:02X}{:02X}{:02X}", mix(low.0, high.0), mix(low.1, high.1), mix(low.2, high.2))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
