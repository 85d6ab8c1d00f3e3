//! Prepare chart data from the dataset: histogram bins, box statistics, scatter points and
//! category counts for one [`ChartRequest`].

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::collections::HashMap;

use crate::dataset::Dataset;
use crate::selector::{ChartKind, ChartRequest};

pub const CHART_ROW_LIMIT: usize = 10_000;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Knobs for chart preparation, filled from the `[chart]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub histogram_bins: usize,
    /// Maximum rows considered per chart. None = all rows.
    pub row_limit: Option<usize>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            row_limit: Some(CHART_ROW_LIMIT),
        }
    }
}

/// Format a numeric axis tick (for y-axis or generic numeric).
pub fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub center: f64,
}

/// Counts for one group, aligned with [`HistogramData::bins`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub name: String,
    pub counts: Vec<f64>,
}

impl HistogramSeries {
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramData {
    pub column: String,
    pub group_column: Option<String>,
    pub bins: Vec<HistogramBin>,
    pub series: Vec<HistogramSeries>,
    pub overlay: bool,
    pub x_min: f64,
    pub x_max: f64,
    pub max_count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotStats {
    pub name: String,
    /// Lower whisker: smallest value inside the 1.5 IQR fence.
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Upper whisker: largest value inside the 1.5 IQR fence.
    pub max: f64,
    pub outliers: Vec<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotData {
    pub column: String,
    pub category_column: String,
    pub stats: Vec<BoxPlotStats>,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterData {
    pub x_column: String,
    pub y_column: String,
    pub color_column: String,
    pub series: Vec<ScatterSeries>,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountData {
    pub column: String,
    /// (category, count) in order of first appearance.
    pub bars: Vec<(String, usize)>,
    pub max_count: usize,
}

/// Plot-ready numbers for one chart request.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Histogram(HistogramData),
    BoxPlot(BoxPlotData),
    Scatter(ScatterData),
    Count(CountData),
}

impl ChartData {
    /// True when there is nothing to draw (every row was null or filtered).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Histogram(d) => d.series.iter().all(|s| s.total() == 0.0),
            Self::BoxPlot(d) => d.stats.is_empty(),
            Self::Scatter(d) => d.series.iter().all(|s| s.points.is_empty()),
            Self::Count(d) => d.bars.is_empty(),
        }
    }
}

/// Prepare the data behind one chart request.
/// Rows with a null or non-finite value in any used column are skipped.
pub fn prepare(dataset: &Dataset, request: &ChartRequest, options: &ChartOptions) -> Result<ChartData> {
    let limit = options.row_limit.unwrap_or(usize::MAX);
    match request.kind {
        ChartKind::Histogram => {
            let values = numeric(dataset, &request.primary_column)?;
            let groups = match request.group_column.as_deref() {
                Some(g) => Some(categorical(dataset, g)?),
                None => None,
            };
            Ok(ChartData::Histogram(histogram(
                request,
                values,
                groups,
                options.histogram_bins,
                limit,
            )))
        }
        ChartKind::BoxPlot => {
            let category_column = request
                .group_column
                .as_deref()
                .ok_or_else(|| eyre!("box plot of '{}' has no category", request.primary_column))?;
            let values = numeric(dataset, &request.primary_column)?;
            let categories = categorical(dataset, category_column)?;
            Ok(ChartData::BoxPlot(box_plot(
                &request.primary_column,
                category_column,
                values,
                categories,
                limit,
            )))
        }
        ChartKind::Scatter => {
            let y_column = request
                .secondary_column
                .as_deref()
                .ok_or_else(|| eyre!("scatter of '{}' has no y column", request.primary_column))?;
            let color_column = request
                .group_column
                .as_deref()
                .ok_or_else(|| eyre!("scatter of '{}' has no color column", request.primary_column))?;
            let xs = numeric(dataset, &request.primary_column)?;
            let ys = numeric(dataset, y_column)?;
            let colors = categorical(dataset, color_column)?;
            Ok(ChartData::Scatter(scatter(
                &request.primary_column,
                y_column,
                color_column,
                xs,
                ys,
                colors,
                limit,
            )))
        }
        ChartKind::CountPlot => {
            let values = categorical(dataset, &request.primary_column)?;
            Ok(ChartData::Count(count(&request.primary_column, values, limit)))
        }
    }
}

fn numeric<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [Option<f64>]> {
    dataset
        .numeric_values(name)
        .ok_or_else(|| eyre!("'{}' is not a numeric column", name))
}

fn categorical<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [Option<String>]> {
    dataset
        .categorical_values(name)
        .ok_or_else(|| eyre!("'{}' is not a categorical column", name))
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Assigns each distinct name an index in order of first appearance.
#[derive(Default)]
struct GroupIndex {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl GroupIndex {
    fn get_or_insert(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Widen a degenerate range so axes and bins have non-zero width.
fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

fn histogram(
    request: &ChartRequest,
    values: &[Option<f64>],
    groups: Option<&[Option<String>]>,
    bins: usize,
    limit: usize,
) -> HistogramData {
    let bins = bins.max(1);

    // (group index, value)
    let mut index = GroupIndex::default();
    let mut rows: Vec<(usize, f64)> = Vec::new();
    for (i, v) in values.iter().take(limit).enumerate() {
        let Some(v) = finite(*v) else { continue };
        let g = match groups {
            Some(groups) => match groups.get(i).and_then(|g| g.as_deref()) {
                Some(name) => index.get_or_insert(name),
                None => continue,
            },
            None => 0,
        };
        rows.push((g, v));
    }
    if groups.is_none() {
        index.get_or_insert(&request.primary_column);
    }

    let (x_min, x_max) = min_max(rows.iter().map(|(_, v)| *v))
        .map(|(lo, hi)| widen(lo, hi))
        .unwrap_or((0.0, 1.0));
    let width = (x_max - x_min) / bins as f64;
    let edges: Vec<HistogramBin> = (0..bins)
        .map(|b| {
            let start = x_min + b as f64 * width;
            let end = if b + 1 == bins { x_max } else { start + width };
            HistogramBin {
                start,
                end,
                center: (start + end) / 2.0,
            }
        })
        .collect();

    let mut series: Vec<HistogramSeries> = index
        .names
        .iter()
        .map(|name| HistogramSeries {
            name: name.clone(),
            counts: vec![0.0; bins],
        })
        .collect();
    for (g, v) in rows {
        let b = (((v - x_min) / width).floor() as usize).min(bins - 1);
        series[g].counts[b] += 1.0;
    }
    let max_count = series
        .iter()
        .flat_map(|s| s.counts.iter().copied())
        .fold(0.0, f64::max);

    HistogramData {
        column: request.primary_column.clone(),
        group_column: request.group_column.clone(),
        bins: edges,
        series,
        overlay: request.overlay,
        x_min,
        x_max,
        max_count,
    }
}

/// Linear-interpolated quantile of sorted, non-empty values.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Tukey box statistics for one group.
pub fn box_stats(name: &str, mut values: Vec<f64>) -> Option<BoxPlotStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile(&values, 0.25);
    let median = quantile(&values, 0.5);
    let q3 = quantile(&values, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let min = values
        .iter()
        .copied()
        .find(|v| *v >= lower_fence)
        .unwrap_or(q1)
        .min(q1);
    let max = values
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= upper_fence)
        .unwrap_or(q3)
        .max(q3);
    let outliers = values
        .iter()
        .copied()
        .filter(|v| *v < lower_fence || *v > upper_fence)
        .collect();

    Some(BoxPlotStats {
        name: name.to_string(),
        min,
        q1,
        median,
        q3,
        max,
        outliers,
        count: values.len(),
    })
}

fn box_plot(
    column: &str,
    category_column: &str,
    values: &[Option<f64>],
    categories: &[Option<String>],
    limit: usize,
) -> BoxPlotData {
    let mut index = GroupIndex::default();
    let mut grouped: Vec<Vec<f64>> = Vec::new();
    for (v, c) in values.iter().zip(categories).take(limit) {
        let (Some(v), Some(c)) = (finite(*v), c.as_deref()) else {
            continue;
        };
        let g = index.get_or_insert(c);
        if g == grouped.len() {
            grouped.push(Vec::new());
        }
        grouped[g].push(v);
    }

    let stats: Vec<BoxPlotStats> = index
        .names
        .iter()
        .zip(grouped)
        .filter_map(|(name, values)| box_stats(name, values))
        .collect();
    let (y_min, y_max) = min_max(stats.iter().flat_map(|s| {
        s.outliers
            .iter()
            .copied()
            .chain([s.min, s.max])
    }))
    .map(|(lo, hi)| widen(lo, hi))
    .unwrap_or((0.0, 1.0));

    BoxPlotData {
        column: column.to_string(),
        category_column: category_column.to_string(),
        stats,
        y_min,
        y_max,
    }
}

fn scatter(
    x_column: &str,
    y_column: &str,
    color_column: &str,
    xs: &[Option<f64>],
    ys: &[Option<f64>],
    colors: &[Option<String>],
    limit: usize,
) -> ScatterData {
    let mut index = GroupIndex::default();
    let mut series: Vec<ScatterSeries> = Vec::new();
    for ((x, y), c) in xs.iter().zip(ys).zip(colors).take(limit) {
        let (Some(x), Some(y), Some(c)) = (finite(*x), finite(*y), c.as_deref()) else {
            continue;
        };
        let g = index.get_or_insert(c);
        if g == series.len() {
            series.push(ScatterSeries {
                name: c.to_string(),
                points: Vec::new(),
            });
        }
        series[g].points.push((x, y));
    }

    let points = || series.iter().flat_map(|s| s.points.iter());
    let (x_min, x_max) = min_max(points().map(|p| p.0))
        .map(|(lo, hi)| widen(lo, hi))
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = min_max(points().map(|p| p.1))
        .map(|(lo, hi)| widen(lo, hi))
        .unwrap_or((0.0, 1.0));

    ScatterData {
        x_column: x_column.to_string(),
        y_column: y_column.to_string(),
        color_column: color_column.to_string(),
        series,
        x_min,
        x_max,
        y_min,
        y_max,
    }
}

fn count(column: &str, values: &[Option<String>], limit: usize) -> CountData {
    let mut index = GroupIndex::default();
    let mut counts: Vec<usize> = Vec::new();
    for v in values.iter().take(limit).flatten() {
        let g = index.get_or_insert(v);
        if g == counts.len() {
            counts.push(0);
        }
        counts[g] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0);
    CountData {
        column: column.to_string(),
        bars: index.names.into_iter().zip(counts).collect(),
        max_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use super::quantile;

    fn drinks() -> Dataset {
        let df = df!(
            "Beverage_category" => &[Some("Coffee"), Some("Smoothies"), Some("Coffee"), Some("Smoothies"), None, Some("Coffee")],
            "Beverage_prep" => &["Short", "Grande", "Tall", "Venti", "Grande", "Tall"],
            "Calories" => &[Some(3.0f64), Some(280.0), Some(4.0), None, Some(90.0), Some(5.0)],
            "Sugars (g)" => &[0.0f64, 41.0, 0.0, 50.0, 12.0, 0.0]
        )
        .unwrap();
        Dataset::from_frame(&df).unwrap()
    }

    fn request(kind: ChartKind, primary: &str, secondary: Option<&str>, group: Option<&str>) -> ChartRequest {
        ChartRequest {
            kind,
            primary_column: primary.to_string(),
            secondary_column: secondary.map(str::to_string),
            group_column: group.map(str::to_string),
            title: String::new(),
            overlay: kind == ChartKind::Histogram && group.is_some(),
        }
    }

    #[test]
    fn ungrouped_histogram_counts_non_null_rows() {
        let ds = drinks();
        let req = request(ChartKind::Histogram, "Calories", None, None);
        let ChartData::Histogram(h) = prepare(&ds, &req, &ChartOptions::default()).unwrap() else {
            panic!("expected histogram");
        };
        assert_eq!(h.bins.len(), DEFAULT_HISTOGRAM_BINS);
        assert_eq!(h.series.len(), 1);
        assert_eq!(h.series[0].name, "Calories");
        assert_eq!(h.series[0].total(), 5.0);
        assert_eq!(h.x_min, 3.0);
        assert_eq!(h.x_max, 280.0);
        // the maximum lands in the last bin
        assert_eq!(h.series[0].counts[DEFAULT_HISTOGRAM_BINS - 1], 1.0);
    }

    #[test]
    fn grouped_histogram_counts_per_group() {
        let ds = drinks();
        let req = request(
            ChartKind::Histogram,
            "Sugars (g)",
            None,
            Some("Beverage_category"),
        );
        let options = ChartOptions {
            histogram_bins: 5,
            row_limit: None,
        };
        let ChartData::Histogram(h) = prepare(&ds, &req, &options).unwrap() else {
            panic!("expected histogram");
        };
        assert!(h.overlay);
        let names: Vec<&str> = h.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Coffee", "Smoothies"]);
        assert_eq!(h.series[0].total(), 3.0);
        assert_eq!(h.series[1].total(), 2.0);
        assert!(h.series.iter().all(|s| s.counts.len() == 5));
    }

    #[test]
    fn row_limit_caps_considered_rows() {
        let ds = drinks();
        let req = request(ChartKind::CountPlot, "Beverage_prep", None, Some("Beverage_prep"));
        let options = ChartOptions {
            histogram_bins: 10,
            row_limit: Some(2),
        };
        let ChartData::Count(c) = prepare(&ds, &req, &options).unwrap() else {
            panic!("expected counts");
        };
        assert_eq!(
            c.bars,
            vec![("Short".to_string(), 1), ("Grande".to_string(), 1)]
        );
    }

    #[test]
    fn count_bars_in_first_appearance_order() {
        let ds = drinks();
        let req = request(ChartKind::CountPlot, "Beverage_prep", None, Some("Beverage_prep"));
        let ChartData::Count(c) = prepare(&ds, &req, &ChartOptions::default()).unwrap() else {
            panic!("expected counts");
        };
        assert_eq!(
            c.bars,
            vec![
                ("Short".to_string(), 1),
                ("Grande".to_string(), 2),
                ("Tall".to_string(), 2),
                ("Venti".to_string(), 1),
            ]
        );
        assert_eq!(c.max_count, 2);
    }

    #[test]
    fn scatter_skips_rows_with_nulls() {
        let ds = drinks();
        let req = request(
            ChartKind::Scatter,
            "Calories",
            Some("Sugars (g)"),
            Some("Beverage_category"),
        );
        let ChartData::Scatter(s) = prepare(&ds, &req, &ChartOptions::default()).unwrap() else {
            panic!("expected scatter");
        };
        assert_eq!(s.series.len(), 2);
        assert_eq!(s.series[0].points, vec![(3.0, 0.0), (4.0, 0.0), (5.0, 0.0)]);
        assert_eq!(s.series[1].points, vec![(280.0, 41.0)]);
        assert_eq!(s.y_max, 41.0);
    }

    #[test]
    fn box_plot_per_category() {
        let ds = drinks();
        let req = request(
            ChartKind::BoxPlot,
            "Sugars (g)",
            None,
            Some("Beverage_prep"),
        );
        let ChartData::BoxPlot(b) = prepare(&ds, &req, &ChartOptions::default()).unwrap() else {
            panic!("expected box plot");
        };
        let names: Vec<&str> = b.stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Short", "Grande", "Tall", "Venti"]);
        let grande = &b.stats[1];
        assert_eq!(grande.count, 2);
        assert_eq!(grande.median, 26.5);
    }

    #[test]
    fn box_stats_are_ordered_and_find_outliers() {
        let s = box_stats("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0]).unwrap();
        assert_eq!(s.q1, 3.0);
        assert_eq!(s.median, 5.0);
        assert_eq!(s.q3, 7.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 8.0);
        assert_eq!(s.outliers, vec![100.0]);
        assert!(s.min <= s.q1 && s.q1 <= s.median && s.median <= s.q3 && s.q3 <= s.max);
    }

    #[test]
    fn box_stats_single_value() {
        let s = box_stats("x", vec![4.0]).unwrap();
        assert_eq!((s.min, s.q1, s.median, s.q3, s.max), (4.0, 4.0, 4.0, 4.0, 4.0));
        assert!(box_stats("x", vec![]).is_none());
    }

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.25), 1.75);
    }

    #[test]
    fn mistyped_request_is_an_error() {
        let ds = drinks();
        let req = request(ChartKind::Histogram, "Beverage_prep", None, None);
        assert!(prepare(&ds, &req, &ChartOptions::default()).is_err());
    }

    #[test]
    fn all_null_column_gives_empty_chart() {
        let df = df!(
            "Calories" => &[None::<f64>, None],
            "Beverage" => &["a", "b"]
        )
        .unwrap();
        let ds = Dataset::from_frame(&df).unwrap();
        let req = request(ChartKind::Histogram, "Calories", None, None);
        let data = prepare(&ds, &req, &ChartOptions::default()).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn format_axis_label_ranges() {
        assert_eq!(format_axis_label(12.5), "12.50");
        assert_eq!(format_axis_label(0.0), "0.00");
        assert_eq!(format_axis_label(2_000_000.0), "2.00e6");
    }
}
