use chrono::Datelike;

use bonusvest_core::series::utc_date;
use bonusvest_engine::{DetailedComparison, WindowComparison};

const WIDTH: i32 = 720;
const HEIGHT: i32 = 360;
const PADDING: f64 = 48.0;
const PLAIN_COLOR: &str = "#2E86AB";
const BONUS_COLOR: &str = "#A23B72";
const INDEX_COLOR: &str = "#F18F01";
const ACCENT_COLOR: &str = "#8c8c8c";

struct LegendEntry<'a> {
    label: String,
    color: &'a str,
}

/// Annualized return of both strategies per window start.
pub fn returns_chart(results: &[WindowComparison], index_label: &str, stock_label: &str) -> String {
    if results.is_empty() {
        return String::new();
    }

    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let xs = x_positions(results.len(), width);
    let plain: Vec<f64> = results.iter().map(|c| c.plain.annualized_return_pct()).collect();
    let bonus: Vec<f64> = results.iter().map(|c| c.bonus.annualized_return_pct()).collect();
    let (min_v, max_v) = extent(plain.iter().chain(&bonus).copied(), true);

    let mut svg = svg_header(WIDTH, HEIGHT);
    title(
        &mut svg,
        &format!("Annualized return by window start: {index_label} vs {stock_label} bonus"),
    );
    value_axis(&mut svg, min_v, max_v, height, |v| format!("{v:.0}%"));

    let zero = scale_value(0.0, min_v, max_v, height);
    svg.push_str(&format!(
        r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{ACCENT_COLOR}" stroke-width="1" stroke-dasharray="4 3" />"#,
        x1 = PADDING,
        x2 = width - PADDING,
        y = zero,
    ));

    let starts: Vec<i64> = results.iter().map(|c| c.window.start_ts).collect();
    add_year_axis(&mut svg, &starts, &xs, height, 2);

    for (values, color) in [(&plain, PLAIN_COLOR), (&bonus, BONUS_COLOR)] {
        let points: Vec<(f64, f64)> = xs
            .iter()
            .zip(values.iter())
            .map(|(&x, &v)| (x, scale_value(v, min_v, max_v, height)))
            .collect();
        svg.push_str(&polyline(&points, color));
    }

    draw_legend(
        &mut svg,
        &[
            LegendEntry {
                label: format!("{index_label} Strategy"),
                color: PLAIN_COLOR,
            },
            LegendEntry {
                label: format!("{stock_label} Bonus Strategy"),
                color: BONUS_COLOR,
            },
        ],
    );
    svg.push_str(svg_footer());
    svg
}

/// Plain portfolio value against the bonus portfolio split into unvested
/// stock (bottom) and matured index holdings (top).
pub fn portfolio_chart(
    detail: &DetailedComparison,
    investment_months: u32,
    index_label: &str,
    stock_label: &str,
) -> String {
    let plain = &detail.plain.trajectory;
    let bonus = &detail.bonus.trajectory;
    if plain.is_empty() || bonus.len() != plain.len() {
        return String::new();
    }

    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let xs = x_positions(plain.len(), width);
    let (min_v, max_v) = extent(
        plain.iter().map(|m| m.total).chain(bonus.iter().map(|m| m.total)),
        true,
    );
    let y = |v: f64| scale_value(v, min_v, max_v, height);

    let mut svg = svg_header(WIDTH, HEIGHT);
    title(&mut svg, "Portfolio value over time");
    value_axis(&mut svg, min_v, max_v, height, |v| format!("${:.0}k", v / 1000.0));

    let timestamps: Vec<i64> = plain.iter().map(|m| m.timestamp).collect();
    add_year_axis(&mut svg, &timestamps, &xs, height, 1);

    let baseline: Vec<(f64, f64)> = xs.iter().map(|&x| (x, y(0.0))).collect();
    let stock_top: Vec<(f64, f64)> = xs
        .iter()
        .zip(bonus)
        .map(|(&x, m)| (x, y(m.stock_value)))
        .collect();
    let total_top: Vec<(f64, f64)> = xs.iter().zip(bonus).map(|(&x, m)| (x, y(m.total))).collect();
    svg.push_str(&area(&baseline, &stock_top, BONUS_COLOR));
    svg.push_str(&area(&stock_top, &total_top, INDEX_COLOR));

    let plain_points: Vec<(f64, f64)> = xs.iter().zip(plain).map(|(&x, m)| (x, y(m.total))).collect();
    svg.push_str(&polyline(&plain_points, PLAIN_COLOR));

    // Trajectory entry k is window month k + 1, so the last contribution sits at H - 1.
    if let Some(&x) = (investment_months as usize)
        .checked_sub(1)
        .and_then(|k| xs.get(k))
    {
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="{ACCENT_COLOR}" stroke-width="1" stroke-dasharray="4 3" /><text x="{tx:.2}" y="{ty:.2}" text-anchor="start">investing ends</text>"#,
            y1 = PADDING,
            y2 = height - PADDING,
            tx = x + 4.0,
            ty = PADDING + 10.0,
        ));
    }

    draw_legend(
        &mut svg,
        &[
            LegendEntry {
                label: format!("{index_label} Strategy"),
                color: PLAIN_COLOR,
            },
            LegendEntry {
                label: format!("{stock_label} unvested"),
                color: BONUS_COLOR,
            },
            LegendEntry {
                label: format!("{stock_label} matured into {index_label}"),
                color: INDEX_COLOR,
            },
        ],
    );
    svg.push_str(svg_footer());
    svg
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style><rect width="{width}" height="{height}" fill="#fff" />"##
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn title(svg: &mut String, text: &str) {
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-size="13" fill="#333">{text}</text>"##,
        x = WIDTH as f64 / 2.0,
        y = PADDING / 2.0,
        text = escape_xml(text),
    ));
}

/// Finite min/max of `values`, optionally stretched to include zero.
fn extent(values: impl Iterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut min_v, mut max_v) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !min_v.is_finite() || !max_v.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        min_v = min_v.min(0.0);
        max_v = max_v.max(0.0);
    }
    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        min_v -= adjust;
        max_v += adjust;
    }
    (min_v, max_v)
}

fn scale_value(value: f64, min_v: f64, max_v: f64, height: f64) -> f64 {
    if (max_v - min_v).abs() < f64::EPSILON {
        return height / 2.0;
    }
    let inner_height = height - 2.0 * PADDING;
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * inner_height
}

fn x_positions(len: usize, width: f64) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![width / 2.0],
        _ => {
            let inner_width = width - 2.0 * PADDING;
            (0..len)
                .map(|i| PADDING + inner_width * (i as f64 / (len - 1) as f64))
                .collect()
        }
    }
}

/// Five gridlines with labels on the left edge.
fn value_axis(svg: &mut String, min_v: f64, max_v: f64, height: f64, label: impl Fn(f64) -> String) {
    let width = WIDTH as f64;
    for step in 0..=4 {
        let v = min_v + (max_v - min_v) * step as f64 / 4.0;
        let y = scale_value(v, min_v, max_v, height);
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#eeeeee" stroke-width="0.5" /><text x="{tx:.2}" y="{ty:.2}" text-anchor="end">{text}</text>"##,
            x1 = PADDING,
            x2 = width - PADDING,
            tx = PADDING - 4.0,
            ty = y + 3.0,
            text = escape_xml(&label(v)),
        ));
    }
}

/// Axis line plus a year label at the first point of every `every`-th year.
fn add_year_axis(svg: &mut String, timestamps: &[i64], xs: &[f64], height: f64, every: i32) {
    let width = WIDTH as f64;
    let axis_y = height - PADDING + 5.0;
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{axis_y:.2}" x2="{x2:.2}" y2="{axis_y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = width - PADDING,
    ));

    let mut last_year = None;
    for (&ts, &x) in timestamps.iter().zip(xs) {
        let Ok(date) = utc_date(ts) else { continue };
        let year = date.year();
        if last_year == Some(year) {
            continue;
        }
        last_year = Some(year);
        if year.rem_euclid(every.max(1)) != 0 {
            continue;
        }
        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{axis_y:.2}" x2="{x:.2}" y2="{tick:.2}" stroke="#ccc" stroke-width="1" /><text x="{x:.2}" y="{ty:.2}" text-anchor="middle">{year}</text>"##,
            tick = axis_y + 4.0,
            ty = axis_y + 16.0,
        ));
    }
}

fn polyline(points: &[(f64, f64)], stroke: &str) -> String {
    if points.is_empty() {
        return String::new();
    }
    format!(
        r#"<polyline fill="none" stroke="{stroke}" stroke-width="1.5" points="{}" />"#,
        coords(points.iter())
    )
}

/// Closed polygon between a lower and an upper edge sharing x positions.
fn area(lower: &[(f64, f64)], upper: &[(f64, f64)], fill: &str) -> String {
    if upper.is_empty() {
        return String::new();
    }
    format!(
        r#"<polygon fill="{fill}" fill-opacity="0.6" stroke="none" points="{}" />"#,
        coords(upper.iter().chain(lower.iter().rev()))
    )
}

fn coords<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> String {
    points
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn draw_legend(svg: &mut String, entries: &[LegendEntry<'_>]) {
    let x = PADDING + 10.0;
    let mut y = PADDING + 14.0;
    for entry in entries {
        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{ly:.2}" x2="{x2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="3" /><text x="{tx:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            ly = y - 4.0,
            x2 = x + 20.0,
            color = entry.color,
            tx = x + 26.0,
            label = escape_xml(&entry.label),
        ));
        y += 16.0;
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonusvest_core::synthetic::synthetic_series;
    use bonusvest_core::{compute_windows, StrategyParams, SyntheticConfig, Window, WindowAlignment};
    use bonusvest_engine::ComparisonEngine;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("S&P <500>"), "S&amp;P &lt;500&gt;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_scale_value_maps_extent_to_padding() {
        let height = HEIGHT as f64;
        assert!((scale_value(10.0, 0.0, 10.0, height) - PADDING).abs() < 1e-9);
        assert!((scale_value(0.0, 0.0, 10.0, height) - (height - PADDING)).abs() < 1e-9);
    }

    #[test]
    fn test_extent_widens_flat_range() {
        assert_eq!(extent([5.0, 5.0].into_iter(), false), (4.5, 5.5));
        assert_eq!(extent([2.0, 3.0].into_iter(), true), (0.0, 3.0));
        assert_eq!(extent(std::iter::empty(), true), (0.0, 1.0));
    }

    #[test]
    fn test_returns_chart_draws_both_strategies() {
        let series = synthetic_series(&SyntheticConfig {
            months: 120,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let windows = compute_windows(&series, 72, WindowAlignment::Monthly);
        let engine = ComparisonEngine::default();
        let results: Vec<_> = windows
            .iter()
            .map(|w| engine.run_window(&series, w).unwrap())
            .collect();

        let svg = returns_chart(&results, "S&P", "UBS");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("S&amp;P Strategy"));
        assert!(svg.contains(">2000<"));
        assert!(returns_chart(&[], "SPY", "UBS").is_empty());
    }

    #[test]
    fn test_portfolio_chart_stacks_bonus_areas() {
        let series = synthetic_series(&SyntheticConfig::default()).unwrap();
        let params = StrategyParams {
            window_months: 120,
            ..StrategyParams::default()
        };
        let window = Window::full(&series).unwrap();
        let detail = ComparisonEngine::new(params.clone())
            .unwrap()
            .run_detailed(&series, &window)
            .unwrap();

        let svg = portfolio_chart(&detail, params.investment_months, "SPY", "UBS");
        assert_eq!(svg.matches("<polygon").count(), 2);
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("investing ends"));
    }
}
