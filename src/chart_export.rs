//! Chart export to PNG (plotters bitmap) and SVG (plotters svg).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::chart_data::{
    format_axis_label, prepare, BoxPlotData, ChartData, ChartOptions, CountData, HistogramData,
    ScatterData,
};
use crate::dataset::Dataset;
use crate::selector::ChartRequest;

/// Export format for chart: PNG or SVG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartExportFormat {
    #[default]
    Png,
    Svg,
}

impl ChartExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
        }
    }
}

impl From<databarista_cli::ExportFormat> for ChartExportFormat {
    fn from(f: databarista_cli::ExportFormat) -> Self {
        match f {
            databarista_cli::ExportFormat::Png => Self::Png,
            databarista_cli::ExportFormat::Svg => Self::Svg,
        }
    }
}

const PALETTE: [RGBColor; 7] = [
    CYAN,
    MAGENTA,
    GREEN,
    YELLOW,
    BLUE,
    RED,
    RGBColor(128, 255, 255),
];

fn palette(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// Write one chart to `path`. Size is (width, height) in pixels.
pub fn write_chart(
    path: &Path,
    data: &ChartData,
    title: &str,
    format: ChartExportFormat,
    size: (u32, u32),
) -> Result<()> {
    if data.is_empty() {
        return Err(eyre!("No data to export"));
    }
    match format {
        ChartExportFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_chart(&root, data, title, Text::Draw)?;
            root.present()?;
        }
        ChartExportFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_chart(&root, data, title, Text::Draw)?;
            root.present()?;
        }
    }
    debug!(path = %path.display(), format = format.as_str(), "wrote chart");
    Ok(())
}

/// File name for a request: slug of the title plus the chart kind.
pub fn export_file_name(request: &ChartRequest, format: ChartExportFormat) -> String {
    format!(
        "{}_{}.{}",
        slug(&request.title),
        request.kind.slug(),
        format.extension()
    )
}

/// Lower-case ASCII alphanumerics; every other run of characters becomes one `_`.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Prepare and write every request into `dir`. Returns the written paths in request order.
pub fn export_requests(
    dir: &Path,
    requests: &[ChartRequest],
    dataset: &Dataset,
    options: &ChartOptions,
    format: ChartExportFormat,
    size: (u32, u32),
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Cannot create export directory {}: {}", dir.display(), e))?;
    let mut written = Vec::with_capacity(requests.len());
    for request in requests {
        let data = prepare(dataset, request, options)?;
        if data.is_empty() {
            return Err(eyre!("No data to export for '{}'", request.title));
        }
        let path = dir.join(export_file_name(request, format));
        write_chart(&path, &data, &request.title, format, size)?;
        written.push(path);
    }
    info!(count = written.len(), dir = %dir.display(), "exported charts");
    Ok(written)
}

/// Whether captions, axis labels and legends are drawn. Text layout needs a system font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Text {
    Draw,
    Skip,
}

fn draw_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &ChartData,
    title: &str,
    text: Text,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    match data {
        ChartData::Histogram(d) => draw_histogram(root, d, title, text),
        ChartData::BoxPlot(d) => draw_box_plot(root, d, title, text),
        ChartData::Scatter(d) => draw_scatter(root, d, title, text),
        ChartData::Count(d) => draw_counts(root, d, title, text),
    }
}

fn chart_builder<'a, 'b, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    title: &str,
    text: Text,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(root);
    builder.margin(30);
    if text == Text::Draw {
        builder
            .caption(title, ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50);
    }
    builder
}

/// Tick formatter that maps integer positions to category names.
fn category_formatter(labels: Vec<String>) -> impl Fn(&f64) -> String {
    move |v: &f64| {
        let idx = v.round();
        if (v - idx).abs() > 0.25 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

fn draw_histogram<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &HistogramData,
    title: &str,
    text: Text,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let y_max = if data.max_count > 0.0 {
        data.max_count * 1.05
    } else {
        1.0
    };
    let mut chart = chart_builder(root, title, text).build_cartesian_2d(data.x_min..data.x_max, 0.0..y_max)?;

    if text == Text::Draw {
        chart
            .configure_mesh()
            .x_desc(data.column.as_str())
            .y_desc("Count")
            .x_label_formatter(&|v| format_axis_label(*v))
            .draw()?;
    }

    let grouped = data.group_column.is_some();
    for (idx, s) in data.series.iter().enumerate() {
        let color = palette(idx);
        let fill = if data.overlay {
            color.mix(0.5).filled()
        } else {
            color.filled()
        };
        let series = chart.draw_series(
            data.bins
                .iter()
                .zip(&s.counts)
                .filter(|(_, count)| **count > 0.0)
                .map(|(bin, count)| Rectangle::new([(bin.start, 0.0), (bin.end, *count)], fill)),
        )?;
        if grouped {
            series
                .label(s.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if grouped && text == Text::Draw {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn draw_box_plot<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &BoxPlotData,
    title: &str,
    text: Text,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_min = -0.5;
    let x_max = (data.stats.len() as f64 - 1.0).max(0.0) + 0.5;
    let mut chart = chart_builder(root, title, text).build_cartesian_2d(x_min..x_max, data.y_min..data.y_max)?;

    if text == Text::Draw {
        let labels: Vec<String> = data.stats.iter().map(|s| s.name.clone()).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len().max(2) * 2)
            .x_desc(data.category_column.as_str())
            .y_desc(data.column.as_str())
            .x_label_formatter(&category_formatter(labels))
            .y_label_formatter(&|v| format_axis_label(*v))
            .draw()?;
    }

    let box_half = 0.3;
    let cap_half = 0.2;

    for (idx, stat) in data.stats.iter().enumerate() {
        let x = idx as f64;
        let color = palette(idx);
        let outline = ShapeStyle::from(&color).stroke_width(1);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - box_half, stat.q1), (x + box_half, stat.q3)],
            color.mix(0.3).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - box_half, stat.q1), (x + box_half, stat.q3)],
            outline,
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - box_half, stat.median), (x + box_half, stat.median)],
            BLACK,
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, stat.min), (x, stat.q1)],
            color,
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, stat.q3), (x, stat.max)],
            color,
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - cap_half, stat.min), (x + cap_half, stat.min)],
            color,
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - cap_half, stat.max), (x + cap_half, stat.max)],
            color,
        )))?;
        chart.draw_series(
            stat.outliers
                .iter()
                .map(|&y| Circle::new((x, y), 3, color.stroke_width(1))),
        )?;
    }

    Ok(())
}

fn draw_scatter<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &ScatterData,
    title: &str,
    text: Text,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = chart_builder(root, title, text).build_cartesian_2d(data.x_min..data.x_max, data.y_min..data.y_max)?;

    if text == Text::Draw {
        chart
            .configure_mesh()
            .x_desc(data.x_column.as_str())
            .y_desc(data.y_column.as_str())
            .x_label_formatter(&|v| format_axis_label(*v))
            .y_label_formatter(&|v| format_axis_label(*v))
            .draw()?;
    }

    for (idx, s) in data.series.iter().enumerate() {
        let color = palette(idx);
        chart
            .draw_series(PointSeries::of_element(
                s.points.iter().copied(),
                3,
                color,
                &|c, s, st| EmptyElement::at(c) + Circle::new((0, 0), s, st.filled()),
            ))?
            .label(s.name.as_str())
            .legend(move |(x, y)| Circle::new((x + 5, y), 3, color.filled()));
    }

    if text == Text::Draw {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn draw_counts<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &CountData,
    title: &str,
    text: Text,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_min = -0.5;
    let x_max = (data.bars.len() as f64 - 1.0).max(0.0) + 0.5;
    let y_max = (data.max_count as f64 * 1.05).max(1.0);
    let mut chart = chart_builder(root, title, text).build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

    if text == Text::Draw {
        let labels: Vec<String> = data.bars.iter().map(|(name, _)| name.clone()).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len().max(2) * 2)
            .x_desc(data.column.as_str())
            .y_desc("Count")
            .x_label_formatter(&category_formatter(labels))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()?;
    }

    chart.draw_series(data.bars.iter().enumerate().map(|(idx, (_, count))| {
        let x = idx as f64;
        Rectangle::new(
            [(x - 0.4, 0.0), (x + 0.4, *count as f64)],
            palette(idx).filled(),
        )
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::ChartKind;
    use polars::prelude::*;

    fn drinks() -> Dataset {
        let df = df!(
            "Beverage_category" => &["Coffee", "Smoothies", "Coffee", "Smoothies"],
            "Calories" => &[3i64, 280, 4, 300],
            "Sugars (g)" => &[0.0f64, 41.0, 0.0, 50.0]
        )
        .unwrap();
        Dataset::from_frame(&df).unwrap()
    }

    fn request(kind: ChartKind, title: &str) -> ChartRequest {
        let (primary, secondary, group) = match kind {
            ChartKind::Histogram => ("Calories", None, Some("Beverage_category")),
            ChartKind::BoxPlot => ("Calories", None, Some("Beverage_category")),
            ChartKind::Scatter => ("Calories", Some("Sugars (g)"), Some("Beverage_category")),
            ChartKind::CountPlot => ("Beverage_category", None, Some("Beverage_category")),
        };
        ChartRequest {
            kind,
            primary_column: primary.to_string(),
            secondary_column: secondary.map(str::to_string),
            group_column: group.map(str::to_string),
            title: title.to_string(),
            overlay: kind == ChartKind::Histogram,
        }
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slug("Calories Vs. Sugars (G)"), "calories_vs_sugars_g");
        assert_eq!(slug("Distribution Of Calories"), "distribution_of_calories");
        assert_eq!(slug("  --  "), "");
    }

    #[test]
    fn file_name_includes_kind() {
        let r = request(ChartKind::Scatter, "Calories Vs. Sugars (G)");
        assert_eq!(
            export_file_name(&r, ChartExportFormat::Svg),
            "calories_vs_sugars_g_scatter.svg"
        );
    }

    fn render_svg(data: &ChartData) -> String {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (320, 240)).into_drawing_area();
            draw_chart(&root, data, "untitled", Text::Skip).expect("draw");
            root.present().expect("present");
        }
        svg
    }

    #[test]
    fn every_kind_draws_shapes_without_text() {
        let ds = drinks();
        for kind in ChartKind::ALL {
            let r = request(kind, kind.as_str());
            let data = prepare(&ds, &r, &ChartOptions::default()).unwrap();
            let svg = render_svg(&data);
            assert!(svg.contains("<svg"), "{}", kind.as_str());
            assert!(!svg.contains("<text"), "{}", kind.as_str());
            let marks = match kind {
                ChartKind::Scatter => svg.matches("<circle").count(),
                ChartKind::BoxPlot => svg.matches("<polyline").count(),
                // The background fill is one rect.
                ChartKind::Histogram | ChartKind::CountPlot => svg.matches("<rect").count() - 1,
            };
            assert!(marks > 0, "{} drew no marks", kind.as_str());
        }
    }

    #[test]
    #[ignore = "text layout needs a system sans-serif font"]
    fn svg_export_writes_every_kind() {
        let ds = drinks();
        let requests: Vec<ChartRequest> = ChartKind::ALL
            .iter()
            .map(|k| request(*k, &format!("Chart {}", k.as_str())))
            .collect();
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = export_requests(
            dir.path(),
            &requests,
            &ds,
            &ChartOptions::default(),
            ChartExportFormat::Svg,
            (640, 480),
        )
        .expect("export");
        assert_eq!(paths.len(), 4);
        for p in &paths {
            let content = std::fs::read_to_string(p).expect("read svg");
            assert!(content.contains("<svg"), "{} is not svg", p.display());
        }
    }

    #[test]
    #[ignore = "text layout needs a system sans-serif font"]
    fn png_export_writes_non_empty_file() {
        let ds = drinks();
        let r = request(ChartKind::BoxPlot, "Distribution Of Calories");
        let data = prepare(&ds, &r, &ChartOptions::default()).unwrap();
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("box.png");
        write_chart(&path, &data, &r.title, ChartExportFormat::Png, (320, 240)).expect("png");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn empty_data_is_an_error() {
        let df = df!(
            "Calories" => &[None::<f64>],
            "Beverage_category" => &["Coffee"]
        )
        .unwrap();
        let ds = Dataset::from_frame(&df).unwrap();
        let r = request(ChartKind::Scatter, "Nothing");
        let dir = tempfile::tempdir().expect("temp dir");
        // Sugars (g) is missing here, so preparation itself fails
        assert!(export_requests(
            dir.path(),
            &[r],
            &ds,
            &ChartOptions::default(),
            ChartExportFormat::Png,
            (100, 100)
        )
        .is_err());

        let mut hist = request(ChartKind::Histogram, "Empty");
        hist.group_column = None;
        hist.overlay = false;
        assert!(export_requests(
            dir.path(),
            &[hist],
            &ds,
            &ChartOptions::default(),
            ChartExportFormat::Png,
            (100, 100)
        )
        .is_err());
    }
}
