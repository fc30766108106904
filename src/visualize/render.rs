//! Chart rendering into text.
//!
//! Charts are drawn with ratatui widgets into an off-screen buffer and the
//! buffer is flattened to plain lines for the REPL.

use std::collections::BTreeMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    symbols::Marker,
    text::Line,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Chart, Dataset, GraphType, Widget},
};

use super::{Bin, ChartKind, ChartPlan};

/// Default drawing area in terminal cells.
pub const DEFAULT_WIDTH: u16 = 72;
pub const DEFAULT_HEIGHT: u16 = 20;

/// Renders every plan, separated by blank lines.
pub fn render_plans(plans: &[ChartPlan], width: u16, height: u16) -> String {
    plans
        .iter()
        .map(|plan| render_chart(plan, width, height))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders one chart to text.
pub fn render_chart(plan: &ChartPlan, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width.max(20), height.max(8));
    let mut buf = Buffer::empty(area);
    let block = Block::bordered().title(plan.title());

    match plan {
        ChartPlan::Bivariate { x, y, kind, points } => match kind {
            ChartKind::Scatter | ChartKind::Line => {
                render_xy(points, x, y, *kind, block, area, &mut buf)
            }
            ChartKind::Bar => render_bars(&mean_by_x(points), block, area, &mut buf),
        },
        ChartPlan::Histogram { bins, .. } => {
            render_bars(&histogram_bars(bins), block, area, &mut buf)
        }
    }

    buffer_to_string(&buf)
}

fn render_xy(
    points: &[(f64, f64)],
    x: &str,
    y: &str,
    kind: ChartKind,
    block: Block<'_>,
    area: Rect,
    buf: &mut Buffer,
) {
    let mut data = points.to_vec();
    if kind == ChartKind::Line {
        data.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let (x_min, x_max) = bounds(data.iter().map(|p| p.0));
    let (y_min, y_max) = bounds(data.iter().map(|p| p.1));

    let dataset = Dataset::default()
        .marker(match kind {
            ChartKind::Line => Marker::Braille,
            _ => Marker::Dot,
        })
        .graph_type(match kind {
            ChartKind::Line => GraphType::Line,
            _ => GraphType::Scatter,
        })
        .data(&data);

    Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title(x.to_string())
                .bounds([x_min, x_max])
                .labels(vec![compact(x_min), compact(x_max)]),
        )
        .y_axis(
            Axis::default()
                .title(y.to_string())
                .bounds([y_min, y_max])
                .labels(vec![compact(y_min), compact(y_max)]),
        )
        .render(area, buf);
}

/// Labels with their value; bar heights are the value scaled to integers.
fn render_bars(bars: &[(String, f64)], block: Block<'_>, area: Rect, buf: &mut Buffer) {
    let inner_width = area.width.saturating_sub(2);
    let count = bars.len().max(1) as u16;
    let bar_width = (inner_width / count).saturating_sub(1).clamp(1, 9);

    let bars: Vec<Bar<'_>> = bars
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .label(Line::from(label.clone()))
                .value((value.max(0.0) * 100.0).round() as u64)
                .text_value(compact(*value))
        })
        .collect();

    BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars))
        .render(area, buf);
}

/// Mean y for each distinct x, ordered by x.
fn mean_by_x(points: &[(f64, f64)]) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<u64, (f64, f64, usize)> = BTreeMap::new();
    for (x, y) in points {
        let entry = groups.entry(order_key(*x)).or_insert((*x, 0.0, 0));
        entry.1 += y;
        entry.2 += 1;
    }
    groups
        .into_values()
        .map(|(x, sum, n)| (compact(x), sum / n as f64))
        .collect()
}

fn histogram_bars(bins: &[Bin]) -> Vec<(String, f64)> {
    bins.iter()
        .map(|b| (compact(b.lower), b.count as f64))
        .collect()
}

/// Maps an f64 to a u64 that sorts the same way.
fn order_key(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

/// Axis bounds, widened when the series is flat.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if max <= min {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

/// Short number text for labels.
fn compact(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{}", v as i64)
    } else if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Flattens a buffer to lines with trailing spaces and blank tail removed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut lines: Vec<String> = (area.top()..area.bottom())
        .map(|y| {
            let line: String = (area.left()..area.right())
                .map(|x| buffer[(x, y)].symbol())
                .collect();
            line.trim_end().to_string()
        })
        .collect();

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scatter() -> ChartPlan {
        ChartPlan::Bivariate {
            x: "units".to_string(),
            y: "revenue".to_string(),
            kind: ChartKind::Scatter,
            points: vec![(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)],
        }
    }

    #[test]
    fn test_scatter_has_title_and_axis_labels() {
        let text = render_chart(&scatter(), 60, 16);
        assert!(text.contains("units vs revenue"));
        assert!(text.contains("units"));
        assert!(text.contains("30"));
        assert!(text.contains('•'));
        assert!(text.lines().count() <= 16);
    }

    #[test]
    fn test_line_chart_renders() {
        let plan = ChartPlan::Bivariate {
            x: "t".to_string(),
            y: "v".to_string(),
            kind: ChartKind::Line,
            points: vec![(3.0, 1.0), (1.0, 2.0), (2.0, 4.0)],
        };
        let text = render_chart(&plan, 40, 12);
        assert!(text.contains("t vs v"));
    }

    #[test]
    fn test_bar_chart_groups_by_x() {
        let groups = mean_by_x(&[(2.0, 4.0), (1.0, 1.0), (2.0, 6.0)]);
        assert_eq!(groups, vec![("1".to_string(), 1.0), ("2".to_string(), 5.0)]);

        let plan = ChartPlan::Bivariate {
            x: "x".to_string(),
            y: "y".to_string(),
            kind: ChartKind::Bar,
            points: vec![(2.0, 4.0), (1.0, 1.0), (2.0, 6.0)],
        };
        let text = render_chart(&plan, 40, 12);
        assert!(text.contains("x vs y"));
    }

    #[test]
    fn test_histogram_renders_title() {
        let plan = ChartPlan::Histogram {
            column: "amount".to_string(),
            bins: vec![
                Bin { lower: 0.0, upper: 5.0, count: 3 },
                Bin { lower: 5.0, upper: 10.0, count: 1 },
            ],
        };
        let text = render_chart(&plan, 40, 12);
        assert!(text.contains("Distribution of amount"));
    }

    #[test]
    fn test_order_key_preserves_order() {
        let values = [-3.5, -1.0, 0.0, 0.5, 2.0];
        let keys: Vec<u64> = values.iter().map(|v| order_key(*v)).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact(3.0), "3");
        assert_eq!(compact(2.25), "2.25");
        assert_eq!(compact(1234.7), "1235");
    }

    #[test]
    fn test_buffer_to_string_trims() {
        let buf = Buffer::with_lines(["ab  ", "    "]);
        assert_eq!(buffer_to_string(&buf), "ab\n");
    }

    #[test]
    fn test_render_plans_joins() {
        let text = render_plans(&[scatter(), scatter()], 40, 10);
        assert_eq!(text.matches("units vs revenue").count(), 2);
    }
}
