//! Terminal rendering of prepared chart data with ratatui `Chart` and `BarChart`.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, BorderType, Borders, Chart, Dataset, GraphType,
        LegendPosition, Paragraph, Widget,
    },
};

use crate::chart_data::{
    format_axis_label, BoxPlotData, ChartData, CountData, HistogramData, ScatterData,
};
use crate::config::{series_color_key, Theme};

/// Bordered chart panel titled with the request title.
pub fn render_chart_panel(
    area: Rect,
    buf: &mut Buffer,
    theme: &Theme,
    title: &str,
    data: &ChartData,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.get("sidebar_border")))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(theme.get("text_primary"))
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    block.render(area, buf);
    render_chart_data(inner, buf, theme, data);
}

pub fn render_chart_data(area: Rect, buf: &mut Buffer, theme: &Theme, data: &ChartData) {
    if data.is_empty() {
        render_message(area, buf, theme, "No data for chart");
        return;
    }
    match data {
        ChartData::Histogram(d) => render_histogram(area, buf, theme, d),
        ChartData::BoxPlot(d) => render_box_plot(area, buf, theme, d),
        ChartData::Scatter(d) => render_scatter(area, buf, theme, d),
        ChartData::Count(d) => render_counts(area, buf, theme, d),
    }
}

/// Centered hint in place of a chart.
pub fn render_message(area: Rect, buf: &mut Buffer, theme: &Theme, message: &str) {
    Paragraph::new(message)
        .style(Style::default().fg(theme.get("text_secondary")))
        .centered()
        .render(area, buf);
}

fn series_color(theme: &Theme, idx: usize) -> Color {
    theme.get(series_color_key(idx))
}

fn three_labels(min: f64, max: f64, style: Style) -> Vec<Span<'static>> {
    vec![
        Span::styled(format_axis_label(min), style),
        Span::styled(format_axis_label((min + max) / 2.0), style),
        Span::styled(format_axis_label(max), style),
    ]
}

/// Widen a degenerate range so the axis has extent.
fn padded(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        (min, max)
    } else {
        (min - 0.5, min + 0.5)
    }
}

fn render_histogram(area: Rect, buf: &mut Buffer, theme: &Theme, data: &HistogramData) {
    let series: Vec<Vec<(f64, f64)>> = data
        .series
        .iter()
        .map(|s| {
            data.bins
                .iter()
                .zip(s.counts.iter())
                .map(|(b, c)| (b.center, *c))
                .collect()
        })
        .collect();

    let (x_min, x_max) = padded(data.x_min, data.x_max);
    let y_max = if data.max_count > 0.0 {
        data.max_count
    } else {
        1.0
    };
    let grouped = data.group_column.is_some();

    let datasets: Vec<Dataset> = data
        .series
        .iter()
        .zip(series.iter())
        .enumerate()
        .map(|(i, (s, points))| {
            Dataset::default()
                .name(if grouped { s.name.clone() } else { String::new() })
                .marker(symbols::Marker::HalfBlock)
                .graph_type(GraphType::Bar)
                .style(Style::default().fg(series_color(theme, i)))
                .data(points)
        })
        .collect();

    let label_style = Style::default().fg(theme.get("text_primary"));
    let x_axis = Axis::default()
        .title(data.column.as_str())
        .bounds([x_min, x_max])
        .style(label_style)
        .labels(three_labels(x_min, x_max, label_style));
    let y_axis = Axis::default()
        .title("Count")
        .bounds([0.0, y_max])
        .style(label_style)
        .labels(three_labels(0.0, y_max, label_style));

    let chart = Chart::new(datasets).x_axis(x_axis).y_axis(y_axis);
    let chart = if grouped {
        chart.legend_position(Some(LegendPosition::TopRight))
    } else {
        chart.legend_position(None)
    };
    chart.render(area, buf);
}

fn render_box_plot(area: Rect, buf: &mut Buffer, theme: &Theme, data: &BoxPlotData) {
    let box_half = 0.3;
    let cap_half = 0.2;
    let mut segments: Vec<(Vec<(f64, f64)>, Style)> = Vec::new();
    let mut outliers: Vec<(Vec<(f64, f64)>, Style)> = Vec::new();
    for (i, stat) in data.stats.iter().enumerate() {
        let x = i as f64;
        let style = Style::default().fg(series_color(theme, i));
        segments.push((
            vec![
                (x - box_half, stat.q1),
                (x + box_half, stat.q1),
                (x + box_half, stat.q3),
                (x - box_half, stat.q3),
                (x - box_half, stat.q1),
            ],
            style,
        ));
        segments.push((
            vec![(x - box_half, stat.median), (x + box_half, stat.median)],
            style,
        ));
        segments.push((vec![(x, stat.min), (x, stat.q1)], style));
        segments.push((vec![(x, stat.q3), (x, stat.max)], style));
        segments.push((vec![(x - cap_half, stat.min), (x + cap_half, stat.min)], style));
        segments.push((vec![(x - cap_half, stat.max), (x + cap_half, stat.max)], style));
        if !stat.outliers.is_empty() {
            outliers.push((stat.outliers.iter().map(|v| (x, *v)).collect(), style));
        }
    }

    let mut datasets: Vec<Dataset> = segments
        .iter()
        .map(|(points, style)| {
            Dataset::default()
                .graph_type(GraphType::Line)
                .marker(symbols::Marker::Braille)
                .style(*style)
                .data(points)
        })
        .collect();
    datasets.extend(outliers.iter().map(|(points, style)| {
        Dataset::default()
            .graph_type(GraphType::Scatter)
            .marker(symbols::Marker::Dot)
            .style(*style)
            .data(points)
    }));

    let x_max = (data.stats.len() as f64 - 1.0).max(0.0) + 0.5;
    let (y_min, y_max) = padded(data.y_min, data.y_max);
    let label_style = Style::default().fg(theme.get("text_primary"));
    let x_labels: Vec<Span> = data
        .stats
        .iter()
        .map(|s| Span::styled(s.name.as_str(), label_style))
        .collect();
    let x_axis = Axis::default()
        .title(data.category_column.as_str())
        .bounds([-0.5, x_max])
        .style(label_style)
        .labels(x_labels);
    let y_axis = Axis::default()
        .title(data.column.as_str())
        .bounds([y_min, y_max])
        .style(label_style)
        .labels(three_labels(y_min, y_max, label_style));

    Chart::new(datasets)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(None)
        .render(area, buf);
}

fn render_scatter(area: Rect, buf: &mut Buffer, theme: &Theme, data: &ScatterData) {
    let datasets: Vec<Dataset> = data
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(series_color(theme, i)))
                .data(&s.points)
        })
        .collect();

    let (x_min, x_max) = padded(data.x_min, data.x_max);
    let (y_min, y_max) = padded(data.y_min, data.y_max);
    let label_style = Style::default().fg(theme.get("text_primary"));
    let x_axis = Axis::default()
        .title(data.x_column.as_str())
        .bounds([x_min, x_max])
        .style(label_style)
        .labels(three_labels(x_min, x_max, label_style));
    let y_axis = Axis::default()
        .title(data.y_column.as_str())
        .bounds([y_min, y_max])
        .style(label_style)
        .labels(three_labels(y_min, y_max, label_style));

    Chart::new(datasets)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(Some(LegendPosition::TopRight))
        .render(area, buf);
}

fn render_counts(area: Rect, buf: &mut Buffer, theme: &Theme, data: &CountData) {
    let n = data.bars.len().max(1) as u16;
    // Fill the width; one column gap between bars.
    let bar_width = (area.width.saturating_sub(n - 1) / n).clamp(1, 12);
    let label_style = Style::default().fg(theme.get("text_primary"));
    let bars: Vec<Bar> = data
        .bars
        .iter()
        .enumerate()
        .map(|(i, (name, count))| {
            let color = series_color(theme, i);
            Bar::default()
                .value(*count as u64)
                .label(Line::from(Span::styled(name.clone(), label_style)))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(data.max_count.max(1) as u64)
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_data::{box_stats, HistogramBin, HistogramSeries, ScatterSeries};

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn empty_data_shows_message() {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        let data = ChartData::Count(CountData {
            column: "Beverage".to_string(),
            bars: Vec::new(),
            max_count: 0,
        });
        render_chart_data(area, &mut buf, &Theme::default(), &data);
        assert!(buffer_text(&buf).contains("No data for chart"));
    }

    #[test]
    fn panel_shows_title_and_axis_names() {
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        let data = ChartData::Histogram(HistogramData {
            column: "Calories".to_string(),
            group_column: None,
            bins: vec![
                HistogramBin {
                    start: 0.0,
                    end: 5.0,
                    center: 2.5,
                },
                HistogramBin {
                    start: 5.0,
                    end: 10.0,
                    center: 7.5,
                },
            ],
            series: vec![HistogramSeries {
                name: "Calories".to_string(),
                counts: vec![3.0, 1.0],
            }],
            overlay: false,
            x_min: 0.0,
            x_max: 10.0,
            max_count: 3.0,
        });
        render_chart_panel(
            area,
            &mut buf,
            &Theme::default(),
            "Distribution Of Calories",
            &data,
        );
        let text = buffer_text(&buf);
        assert!(text.contains("Distribution Of Calories"));
        assert!(text.contains("Count"));
    }

    #[test]
    fn box_plot_and_scatter_show_axis_titles() {
        let area = Rect::new(0, 0, 60, 16);
        let theme = Theme::default();
        let coffee = box_stats("coffee", vec![1.0, 2.0, 3.0, 4.0, 50.0]).unwrap();
        let tea = box_stats("tea", vec![2.0, 3.0, 5.0]).unwrap();
        let data = ChartData::BoxPlot(BoxPlotData {
            column: "Calories".to_string(),
            category_column: "Beverage_category".to_string(),
            y_min: 1.0,
            y_max: 50.0,
            stats: vec![coffee, tea],
        });
        let mut buf = Buffer::empty(area);
        render_chart_data(area, &mut buf, &theme, &data);
        assert!(buffer_text(&buf).contains("Calories"));

        let data = ChartData::Scatter(ScatterData {
            x_column: "Calories".to_string(),
            y_column: "Sugars (g)".to_string(),
            color_column: "Beverage_category".to_string(),
            series: vec![ScatterSeries {
                name: "tea".to_string(),
                points: vec![(1.0, 1.0), (2.0, 4.0)],
            }],
            x_min: 1.0,
            x_max: 2.0,
            y_min: 1.0,
            y_max: 4.0,
        });
        let mut buf = Buffer::empty(area);
        render_chart_data(area, &mut buf, &theme, &data);
        assert!(buffer_text(&buf).contains("Sugars (g)"));
    }
}
