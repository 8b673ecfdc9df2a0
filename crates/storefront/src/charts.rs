//! SVG charts for the admin dashboard.
//!
//! Charts are drawn with `plotters` into an SVG string on the server and
//! embedded inline by the dashboard template. Both chart kinds use a
//! categorical x axis (one segment per row) and a y axis starting at zero.

use plotters::prelude::*;
use plotters_svg::SVGBackend;

/// Rendered size in pixels; the SVG scales with its container.
pub const SIZE: (u32, u32) = (600, 300);

const MARGIN: u32 = 10;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 60;
const Y_LABELS: usize = 5;
const MAX_X_LABELS: usize = 8;
const MAX_BAR_LABEL: usize = 12;

const LINE: RGBColor = RGBColor(46, 125, 50);
const BAR: RGBColor = RGBColor(255, 143, 0);
const GRID: RGBColor = RGBColor(224, 224, 224);
const AXIS: RGBColor = RGBColor(97, 97, 97);

type DrawResult<'a> = Result<(), Box<dyn std::error::Error + Send + Sync + 'a>>;

#[derive(Debug, thiserror::Error)]
#[error("chart rendering failed: {0}")]
pub struct ChartError(String);

/// Money-valued line chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChart {
    svg: String,
}

impl LineChart {
    /// Plot `(label, amount)` pairs in order. `None` when there is nothing to
    /// plot.
    ///
    /// # Errors
    ///
    /// Returns an error if plotters fails to lay out or draw the chart.
    pub fn build(series: &[(String, f64)]) -> Result<Option<Self>, ChartError> {
        if series.is_empty() {
            return Ok(None);
        }

        let mut svg = String::new();
        {
            let backend = SVGBackend::with_string(&mut svg, SIZE);
            draw_line(backend, series).map_err(|e| ChartError(e.to_string()))?;
        }
        Ok(Some(Self { svg }))
    }

    /// The `<svg>` element.
    #[must_use]
    pub fn svg(&self) -> &str {
        &self.svg
    }
}

/// Count-valued bar chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarChart {
    svg: String,
}

impl BarChart {
    /// Plot `(label, count)` pairs in order. `None` when there is nothing to
    /// plot.
    ///
    /// # Errors
    ///
    /// Returns an error if plotters fails to lay out or draw the chart.
    pub fn build(series: &[(String, u64)]) -> Result<Option<Self>, ChartError> {
        if series.is_empty() {
            return Ok(None);
        }

        let mut svg = String::new();
        {
            let backend = SVGBackend::with_string(&mut svg, SIZE);
            draw_bars(backend, series).map_err(|e| ChartError(e.to_string()))?;
        }
        Ok(Some(Self { svg }))
    }

    /// The `<svg>` element.
    #[must_use]
    pub fn svg(&self) -> &str {
        &self.svg
    }
}

fn draw_line<'a, DB>(backend: DB, series: &[(String, f64)]) -> DrawResult<'a>
where
    DB: 'a + DrawingBackend,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let top = series.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let y_max = if top > 0.0 { top * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(segments(series.len()).into_segmented(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(GRID)
        .light_line_style(WHITE)
        .axis_style(AXIS)
        .label_style(("sans-serif", 12.0).into_font().color(&AXIS))
        .x_labels(MAX_X_LABELS)
        .x_label_formatter(&|x| label_at(x, series))
        .y_labels(Y_LABELS)
        .y_label_formatter(&|y| money(*y))
        .draw()?;

    let points = || {
        series
            .iter()
            .enumerate()
            .map(|(i, (_, v))| (SegmentValue::CenterOf(segment(i)), *v))
    };
    chart.draw_series(LineSeries::new(points(), LINE.stroke_width(2)))?;
    chart.draw_series(points().map(|p| Circle::new(p, 3_u32, LINE.filled())))?;

    root.present()?;
    Ok(())
}

fn draw_bars<'a, DB>(backend: DB, series: &[(String, u64)]) -> DrawResult<'a>
where
    DB: 'a + DrawingBackend,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    let top = series.iter().map(|(_, v)| *v).max().unwrap_or(0);
    // Headroom above the tallest bar, and a visible axis for all-zero data
    let y_max = top + top / 10 + 1;

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(segments(series.len()).into_segmented(), 0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(GRID)
        .light_line_style(WHITE)
        .axis_style(AXIS)
        .label_style(("sans-serif", 12.0).into_font().color(&AXIS))
        .x_labels(series.len())
        .x_label_formatter(&|x| label_at(x, series))
        .y_labels(Y_LABELS)
        .y_label_formatter(&|y| y.to_string())
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR.filled())
            .margin(12)
            .data(series.iter().enumerate().map(|(i, (_, v))| (segment(i), *v))),
    )?;

    root.present()?;
    Ok(())
}

/// One segment per row. Integer ranges are inclusive in plotters.
fn segments(rows: usize) -> std::ops::Range<u32> {
    0..segment(rows.saturating_sub(1))
}

fn segment(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Category label for the centre of a segment; boundaries stay blank.
fn label_at<V>(value: &SegmentValue<u32>, series: &[(String, V)]) -> String {
    match value {
        SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| series.get(i))
            .map(|(label, _)| shorten(label))
            .unwrap_or_default(),
        SegmentValue::Exact(_) | SegmentValue::Last => String::new(),
    }
}

fn money(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("${value:.0}")
    } else {
        format!("${value:.2}")
    }
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= MAX_BAR_LABEL {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX_BAR_LABEL - 1).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<(String, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("2026-01-{:02}", i + 1), *v))
            .collect()
    }

    #[test]
    fn test_empty_series_has_no_chart() {
        assert!(LineChart::build(&[]).unwrap().is_none());
        assert!(BarChart::build(&[]).unwrap().is_none());
    }

    #[test]
    fn test_line_chart_renders_svg_with_money_axis() {
        let chart = LineChart::build(&series(&[0.0, 200.0, 400.0]))
            .unwrap()
            .unwrap();
        let svg = chart.svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("$0"));
        assert!(svg.contains("2026-01-01"));
    }

    #[test]
    fn test_single_point_and_flat_zero_series_render() {
        assert!(LineChart::build(&series(&[50.0])).unwrap().is_some());
        assert!(LineChart::build(&series(&[0.0, 0.0])).unwrap().is_some());
        let zeros = vec![("Yoga".to_string(), 0_u64)];
        assert!(BarChart::build(&zeros).unwrap().is_some());
    }

    #[test]
    fn test_bar_chart_draws_a_bar_per_item() {
        let bars = vec![
            ("Mancuernas".to_string(), 8_u64),
            ("Cuerda para saltar profesional".to_string(), 2),
        ];
        let svg = BarChart::build(&bars).unwrap().unwrap().svg().to_string();
        // background plus one rect per bar
        assert!(svg.matches("<rect").count() >= 3);
        assert!(svg.contains("Mancuernas"));
        assert!(!svg.contains("Cuerda para saltar profesional"));
    }

    #[test]
    fn test_labels() {
        let rows = vec![("Proteína Whey".to_string(), 1_u64)];
        assert_eq!(label_at(&SegmentValue::CenterOf(0), &rows), "Proteína Wh…");
        assert_eq!(label_at(&SegmentValue::Exact(0), &rows), "");
        assert_eq!(label_at(&SegmentValue::CenterOf(5), &rows), "");
        assert_eq!(money(150.0), "$150");
        assert_eq!(money(12.5), "$12.50");
    }
}
