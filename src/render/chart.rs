//! Inline SVG charts: line charts with gaps for missing values and scatter
//! plots with an overlaid trendline.

use crate::render::escape_html;
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 340.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 48.0;

pub const PALETTE: [&str; 4] = ["#636efa", "#ef553b", "#00cc96", "#ab63fa"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxis {
    /// x values are days since 1970-01-01.
    Date,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Line,
    Markers,
}

#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub color: &'static str,
    pub mark: Mark,
    pub points: Vec<(f64, Option<f64>)>,
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub x_axis: XAxis,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub font_family: Option<String>,
}

pub fn date_to_x(date: NaiveDate) -> f64 {
    date.signed_duration_since(NaiveDate::default()).num_days() as f64
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::days(x.round() as i64))
}

fn nice_step(span: f64, target_ticks: f64) -> f64 {
    let raw = span / target_ticks;
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = if residual < 1.5 {
        1.0
    } else if residual < 3.0 {
        2.0
    } else if residual < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn ticks(lo: f64, hi: f64) -> Vec<f64> {
    let step = nice_step(hi - lo, 5.0);
    if !step.is_finite() || step <= 0.0 {
        return vec![lo];
    }
    let first = (lo / step).ceil() * step;
    (0..)
        .map(|i| first + step * i as f64)
        .take_while(|t| *t <= hi + step * 1e-9)
        .take(50)
        .collect()
}

fn format_tick(axis: XAxis, value: f64, span: f64) -> String {
    match axis {
        XAxis::Date => match x_to_date(value) {
            // 兩年以上只顯示年份
            Some(date) if span > 730.0 => date.year().to_string(),
            Some(date) => date.format("%Y-%m").to_string(),
            None => String::new(),
        },
        XAxis::Numeric => {
            if value.fract().abs() < 1e-9 {
                format!("{:.0}", value)
            } else {
                let trimmed = format!("{:.3}", value);
                trimmed.trim_end_matches('0').trim_end_matches('.').to_string()
            }
        }
    }
}

/// Data bounds padded so a single point or flat line still has extent.
fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    if (hi - lo).abs() < 1e-12 {
        let pad = (lo.abs() * 0.05).max(0.5);
        return Some((lo - pad, hi + pad));
    }
    let pad = (hi - lo) * 0.05;
    Some((lo - pad, hi + pad))
}

impl Chart {
    pub fn render(&self) -> String {
        let present = || {
            self.series
                .iter()
                .flat_map(|s| s.points.iter().filter_map(|(x, y)| y.map(|y| (*x, y))))
                .filter(|(x, y)| x.is_finite() && y.is_finite())
        };

        let font = self
            .font_family
            .as_deref()
            .map(|f| format!("{}, sans-serif", escape_html(f)))
            .unwrap_or_else(|| "sans-serif".to_string());

        let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) =
            (bounds(present().map(|p| p.0)), bounds(present().map(|p| p.1)))
        else {
            return format!(
                r##"<svg class="chart" viewBox="0 0 {w} {h}" font-family="{font}" role="img"><text x="{cx}" y="{cy}" text-anchor="middle" fill="#888">표시할 데이터가 없습니다</text></svg>"##,
                w = WIDTH,
                h = HEIGHT,
                cx = WIDTH / 2.0,
                cy = HEIGHT / 2.0,
            );
        };

        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let sx = |x: f64| MARGIN_LEFT + (x - x_lo) / (x_hi - x_lo) * plot_w;
        let sy = |y: f64| MARGIN_TOP + plot_h - (y - y_lo) / (y_hi - y_lo) * plot_h;

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg class="chart" viewBox="0 0 {} {}" font-family="{}" font-size="14" role="img">"#,
            WIDTH,
            HEIGHT,
            font
        );
        let _ = write!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#e5ecf6\"/>",
            MARGIN_LEFT,
            MARGIN_TOP,
            plot_w,
            plot_h
        );

        for t in ticks(y_lo, y_hi) {
            let y = sy(t);
            let _ = write!(
                svg,
                "<line x1=\"{:.1}\" x2=\"{:.1}\" y1=\"{y:.1}\" y2=\"{y:.1}\" stroke=\"#fff\"/>\
                 <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"12\">{}</text>",
                MARGIN_LEFT,
                MARGIN_LEFT + plot_w,
                MARGIN_LEFT - 6.0,
                y + 4.0,
                format_tick(XAxis::Numeric, t, y_hi - y_lo)
            );
        }
        for t in ticks(x_lo, x_hi) {
            let x = sx(t);
            let _ = write!(
                svg,
                "<line x1=\"{x:.1}\" x2=\"{x:.1}\" y1=\"{:.1}\" y2=\"{:.1}\" stroke=\"#fff\"/>\
                 <text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">{}</text>",
                MARGIN_TOP,
                MARGIN_TOP + plot_h,
                MARGIN_TOP + plot_h + 18.0,
                format_tick(self.x_axis, t, x_hi - x_lo)
            );
        }

        for series in &self.series {
            match series.mark {
                Mark::Line => {
                    for segment in segments(&series.points) {
                        let d: Vec<String> = segment
                            .iter()
                            .enumerate()
                            .map(|(i, (x, y))| format!("{}{:.1},{:.1}", if i == 0 { 'M' } else { 'L' }, sx(*x), sy(*y)))
                            .collect();
                        if segment.len() == 1 {
                            let (x, y) = segment[0];
                            let _ = write!(svg, r#"<circle cx="{:.1}" cy="{:.1}" r="2.5" fill="{}"/>"#, sx(x), sy(y), series.color);
                        } else {
                            let _ = write!(
                                svg,
                                r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                                d.join(" "),
                                series.color
                            );
                        }
                    }
                }
                Mark::Markers => {
                    for (x, y) in series.points.iter().filter_map(|(x, y)| y.map(|y| (*x, y))) {
                        let _ = write!(
                            svg,
                            r#"<circle cx="{:.1}" cy="{:.1}" r="5" fill="{}" fill-opacity="0.8"><title>{}, {}</title></circle>"#,
                            sx(x),
                            sy(y),
                            series.color,
                            format_tick(self.x_axis, x, 0.0),
                            format!("{:.2}", y)
                        );
                    }
                }
            }
        }

        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            HEIGHT - 8.0,
            escape_html(&self.x_label)
        );
        let _ = write!(
            svg,
            r#"<text transform="translate(16,{:.1}) rotate(-90)" text-anchor="middle">{}</text>"#,
            MARGIN_TOP + plot_h / 2.0,
            escape_html(&self.y_label)
        );

        if self.series.len() > 1 {
            for (i, series) in self.series.iter().enumerate() {
                let x = MARGIN_LEFT + 8.0 + i as f64 * 220.0;
                let _ = write!(
                    svg,
                    r#"<rect x="{x:.1}" y="10" width="14" height="14" fill="{}"/><text x="{:.1}" y="22">{}</text>"#,
                    series.color,
                    x + 20.0,
                    escape_html(&series.name)
                );
            }
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Runs of consecutive present points; a missing value breaks the line.
fn segments(points: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (x, y) in points {
        match y {
            Some(y) if y.is_finite() && x.is_finite() => current.push((*x, *y)),
            _ => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: Vec<(f64, Option<f64>)>) -> Chart {
        Chart {
            x_axis: XAxis::Numeric,
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            series: vec![Series {
                name: "s".to_string(),
                color: PALETTE[0],
                mark: Mark::Line,
                points,
            }],
            font_family: None,
        }
    }

    #[test]
    fn test_segments_split_on_gaps() {
        let segs = segments(&[(0.0, Some(1.0)), (1.0, None), (2.0, Some(2.0)), (3.0, Some(3.0))]);
        assert_eq!(segs, vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]);
    }

    #[test]
    fn test_empty_chart_renders_placeholder() {
        let svg = line(vec![(0.0, None)]).render();
        assert!(svg.contains("표시할 데이터가 없습니다"));
    }

    #[test]
    fn test_line_chart_draws_path() {
        let svg = line(vec![(0.0, Some(1.0)), (1.0, Some(2.0))]).render();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut chart = line(vec![(0.0, Some(1.0)), (1.0, Some(2.0))]);
        chart.x_label = "<b>".to_string();
        assert!(chart.render().contains("&lt;b&gt;"));
    }

    #[test]
    fn test_ticks_are_nice() {
        assert_eq!(ticks(0.0, 10.0), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_step(100.0, 5.0), 20.0);
    }

    #[test]
    fn test_date_axis_round_trip() {
        let date = NaiveDate::from_ymd_opt(2005, 6, 30).unwrap();
        assert_eq!(x_to_date(date_to_x(date)), Some(date));
    }
}
