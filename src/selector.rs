//! Visualization selector: turns the EDA picker state into chart requests.
//!
//! [`select_charts`] is a pure function of the typed schema and the current
//! [`Selections`]. Kinds are evaluated independently in a fixed order. A kind
//! whose picks are incomplete, or whose picks do not have the type the kind
//! needs, yields no request.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{ColumnKind, TableSchema};

/// Chart kinds offered by the EDA page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    BoxPlot,
    Scatter,
    CountPlot,
}

impl ChartKind {
    /// Evaluation and display order.
    pub const ALL: [Self; 4] = [Self::Histogram, Self::BoxPlot, Self::Scatter, Self::CountPlot];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Histogram => "Histograms",
            Self::BoxPlot => "Box Plots",
            Self::Scatter => "Scatterplots",
            Self::CountPlot => "Count Plots",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Self::Histogram => "Histograms - Visualizing Numerical Distributions",
            Self::BoxPlot => "Box Plots - Visualizing Numerical Distributions",
            Self::Scatter => "Scatterplots - Visualizing Relationships",
            Self::CountPlot => "Count Plots - Visualizing Categorical Distributions",
        }
    }

    /// Short name used in exported file names.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::BoxPlot => "box_plot",
            Self::Scatter => "scatter",
            Self::CountPlot => "count_plot",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramSelection {
    /// Numeric column to bin.
    pub column: Option<String>,
    /// "Show by Category": split bars by a categorical column.
    pub group_by_category: bool,
    /// Categorical column used when `group_by_category` is set.
    pub group_column: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxPlotSelection {
    /// Numeric column measured on the y axis.
    pub column: Option<String>,
    /// Categorical column on the x axis, also used for color. Required.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSelection {
    pub x: Option<String>,
    pub y: Option<String>,
    /// Categorical column coloring the points. Required.
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountPlotSelection {
    pub column: Option<String>,
}

/// Complete picker state for one interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selections {
    /// Enabled chart kinds. Treated as a set; order and duplicates do not matter.
    pub enabled: Vec<ChartKind>,
    pub histogram: HistogramSelection,
    pub box_plot: BoxPlotSelection,
    pub scatter: ScatterSelection,
    pub count_plot: CountPlotSelection,
}

impl Selections {
    pub fn is_enabled(&self, kind: ChartKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Enable or disable a kind. Picks for the kind are kept either way.
    pub fn set_enabled(&mut self, kind: ChartKind, enabled: bool) {
        if enabled {
            if !self.is_enabled(kind) {
                self.enabled.push(kind);
            }
        } else {
            self.enabled.retain(|k| *k != kind);
        }
    }

    pub fn toggle(&mut self, kind: ChartKind) {
        let enabled = !self.is_enabled(kind);
        self.set_enabled(kind, enabled);
    }
}

/// One chart to render. Plain value; discarded after rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    /// Histogram/BoxPlot measured column, Scatter x, CountPlot category.
    pub primary_column: String,
    /// Scatter y.
    pub secondary_column: Option<String>,
    /// Color/grouping column; always categorical.
    pub group_column: Option<String>,
    pub title: String,
    /// Grouped histogram bars overlap instead of stacking.
    pub overlay: bool,
}

/// Map the current selections to chart requests, at most one per enabled kind.
pub fn select_charts(schema: &TableSchema, selections: &Selections) -> Vec<ChartRequest> {
    let requests: Vec<ChartRequest> = ChartKind::ALL
        .iter()
        .filter(|kind| selections.is_enabled(**kind))
        .filter_map(|kind| match kind {
            ChartKind::Histogram => histogram_request(schema, &selections.histogram),
            ChartKind::BoxPlot => box_plot_request(schema, &selections.box_plot),
            ChartKind::Scatter => scatter_request(schema, &selections.scatter),
            ChartKind::CountPlot => count_plot_request(schema, &selections.count_plot),
        })
        .collect();
    debug!(
        enabled = selections.enabled.len(),
        emitted = requests.len(),
        "selected charts"
    );
    requests
}

/// The picked column, if it exists in the schema with the required kind.
fn typed<'a>(schema: &TableSchema, pick: &'a Option<String>, kind: ColumnKind) -> Option<&'a str> {
    let name = pick.as_deref()?;
    (schema.kind_of(name) == Some(kind)).then_some(name)
}

fn histogram_request(schema: &TableSchema, sel: &HistogramSelection) -> Option<ChartRequest> {
    let column = typed(schema, &sel.column, ColumnKind::Numeric)?;
    let group_column = if sel.group_by_category {
        Some(typed(schema, &sel.group_column, ColumnKind::Categorical)?.to_string())
    } else {
        None
    };
    Some(ChartRequest {
        kind: ChartKind::Histogram,
        primary_column: column.to_string(),
        secondary_column: None,
        overlay: group_column.is_some(),
        group_column,
        title: distribution_title(column),
    })
}

fn box_plot_request(schema: &TableSchema, sel: &BoxPlotSelection) -> Option<ChartRequest> {
    let column = typed(schema, &sel.column, ColumnKind::Numeric)?;
    let category = typed(schema, &sel.category, ColumnKind::Categorical)?;
    Some(ChartRequest {
        kind: ChartKind::BoxPlot,
        primary_column: column.to_string(),
        secondary_column: None,
        group_column: Some(category.to_string()),
        title: distribution_title(column),
        overlay: false,
    })
}

fn scatter_request(schema: &TableSchema, sel: &ScatterSelection) -> Option<ChartRequest> {
    let x = typed(schema, &sel.x, ColumnKind::Numeric)?;
    let y = typed(schema, &sel.y, ColumnKind::Numeric)?;
    let color = typed(schema, &sel.color, ColumnKind::Categorical)?;
    Some(ChartRequest {
        kind: ChartKind::Scatter,
        primary_column: x.to_string(),
        secondary_column: Some(y.to_string()),
        group_column: Some(color.to_string()),
        title: relationship_title(x, y),
        overlay: false,
    })
}

fn count_plot_request(schema: &TableSchema, sel: &CountPlotSelection) -> Option<ChartRequest> {
    let column = typed(schema, &sel.column, ColumnKind::Categorical)?;
    Some(ChartRequest {
        kind: ChartKind::CountPlot,
        primary_column: column.to_string(),
        secondary_column: None,
        group_column: Some(column.to_string()),
        title: distribution_title(column),
        overlay: false,
    })
}

/// "Distribution of <column>", title-cased.
pub fn distribution_title(column: &str) -> String {
    format_title(&format!("Distribution of {column}"))
}

/// "<x> vs. <y>", title-cased.
pub fn relationship_title(x: &str, y: &str) -> String {
    format_title(&format!("{x} vs. {y}"))
}

/// Title-case every word, then turn underscores into spaces.
pub fn format_title(s: &str) -> String {
    title_case(s).replace('_', " ")
}

/// Upper-case a letter that follows a non-letter and lower-case every other letter.
/// Digits, punctuation and underscores all start a new word: "sugars (g)" becomes "Sugars (G)".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        let cased = c.is_lowercase() || c.is_uppercase();
        if cased {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnInfo;

    fn schema() -> TableSchema {
        let col = |name: &str, kind| ColumnInfo {
            name: name.to_string(),
            kind,
            dtype: String::new(),
        };
        TableSchema::new(vec![
            col("Beverage_category", ColumnKind::Categorical),
            col("Beverage", ColumnKind::Categorical),
            col("Beverage_prep", ColumnKind::Categorical),
            col("Calories", ColumnKind::Numeric),
            col("Sugars (g)", ColumnKind::Numeric),
            col("Caffeine (mg)", ColumnKind::Numeric),
        ])
    }

    fn pick(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn only(kind: ChartKind) -> Selections {
        Selections {
            enabled: vec![kind],
            ..Default::default()
        }
    }

    #[test]
    fn histogram_without_grouping() {
        let mut sel = only(ChartKind::Histogram);
        sel.histogram.column = pick("Calories");
        let requests = select_charts(&schema(), &sel);
        assert_eq!(
            requests,
            vec![ChartRequest {
                kind: ChartKind::Histogram,
                primary_column: "Calories".to_string(),
                secondary_column: None,
                group_column: None,
                title: "Distribution Of Calories".to_string(),
                overlay: false,
            }]
        );
    }

    #[test]
    fn histogram_grouped_by_category() {
        let mut sel = only(ChartKind::Histogram);
        sel.histogram.column = pick("Sugars (g)");
        sel.histogram.group_by_category = true;
        sel.histogram.group_column = pick("Beverage_category");
        let requests = select_charts(&schema(), &sel);
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].group_column.as_deref(),
            Some("Beverage_category")
        );
        assert!(requests[0].overlay);
        assert_eq!(requests[0].title, "Distribution Of Sugars (G)");
    }

    #[test]
    fn histogram_grouping_requested_without_column_emits_nothing() {
        let mut sel = only(ChartKind::Histogram);
        sel.histogram.column = pick("Calories");
        sel.histogram.group_by_category = true;
        assert!(select_charts(&schema(), &sel).is_empty());
    }

    #[test]
    fn histogram_group_column_ignored_when_flag_off() {
        let mut sel = only(ChartKind::Histogram);
        sel.histogram.column = pick("Calories");
        sel.histogram.group_column = pick("Beverage");
        let requests = select_charts(&schema(), &sel);
        assert_eq!(requests[0].group_column, None);
        assert!(!requests[0].overlay);
    }

    #[test]
    fn incomplete_histogram_emits_nothing() {
        assert!(select_charts(&schema(), &only(ChartKind::Histogram)).is_empty());
    }

    #[test]
    fn box_plot_requires_category() {
        let mut sel = only(ChartKind::BoxPlot);
        sel.box_plot.column = pick("Calories");
        assert!(select_charts(&schema(), &sel).is_empty());

        sel.box_plot.category = pick("Beverage_prep");
        let requests = select_charts(&schema(), &sel);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, ChartKind::BoxPlot);
        assert_eq!(requests[0].group_column.as_deref(), Some("Beverage_prep"));
        assert_eq!(requests[0].title, "Distribution Of Calories");
    }

    #[test]
    fn scatter_title_and_columns() {
        let mut sel = only(ChartKind::Scatter);
        sel.scatter.x = pick("Calories");
        sel.scatter.y = pick("Sugars (g)");
        sel.scatter.color = pick("Beverage_category");
        let requests = select_charts(&schema(), &sel);
        assert_eq!(requests.len(), 1);
        let r = &requests[0];
        assert_eq!(r.title, "Calories Vs. Sugars (G)");
        assert_eq!(r.primary_column, "Calories");
        assert_eq!(r.secondary_column.as_deref(), Some("Sugars (g)"));
        assert_eq!(r.group_column.as_deref(), Some("Beverage_category"));
    }

    #[test]
    fn scatter_requires_color() {
        let mut sel = only(ChartKind::Scatter);
        sel.scatter.x = pick("Calories");
        sel.scatter.y = pick("Sugars (g)");
        assert!(select_charts(&schema(), &sel).is_empty());
    }

    #[test]
    fn count_plot_colors_by_itself() {
        let mut sel = only(ChartKind::CountPlot);
        sel.count_plot.column = pick("Beverage");
        let requests = select_charts(&schema(), &sel);
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].group_column.as_deref(),
            Some(requests[0].primary_column.as_str())
        );
        assert_eq!(requests[0].title, "Distribution Of Beverage");
    }

    #[test]
    fn underscores_become_spaces() {
        let mut sel = only(ChartKind::CountPlot);
        sel.count_plot.column = pick("Beverage_category");
        let requests = select_charts(&schema(), &sel);
        assert_eq!(requests[0].title, "Distribution Of Beverage Category");
    }

    #[test]
    fn no_kinds_means_no_requests() {
        let mut sel = Selections::default();
        sel.histogram.column = pick("Calories");
        sel.box_plot.column = pick("Calories");
        sel.box_plot.category = pick("Beverage");
        sel.scatter.x = pick("Calories");
        sel.scatter.y = pick("Calories");
        sel.scatter.color = pick("Beverage");
        sel.count_plot.column = pick("Beverage");
        assert!(select_charts(&schema(), &sel).is_empty());
    }

    #[test]
    fn mistyped_picks_fail_closed() {
        let mut sel = Selections {
            enabled: ChartKind::ALL.to_vec(),
            ..Default::default()
        };
        sel.histogram.column = pick("Beverage");
        sel.box_plot.column = pick("Calories");
        sel.box_plot.category = pick("Sugars (g)");
        sel.scatter.x = pick("Calories");
        sel.scatter.y = pick("Beverage");
        sel.scatter.color = pick("Beverage");
        sel.count_plot.column = pick("Calories");
        assert!(select_charts(&schema(), &sel).is_empty());

        sel.count_plot.column = pick("No Such Column");
        assert!(select_charts(&schema(), &sel).is_empty());
    }

    #[test]
    fn kinds_are_independent_and_ordered() {
        let mut sel = Selections {
            enabled: vec![ChartKind::CountPlot, ChartKind::BoxPlot, ChartKind::Histogram],
            ..Default::default()
        };
        sel.histogram.column = pick("Calories");
        sel.count_plot.column = pick("Beverage");
        // box plot left incomplete
        sel.box_plot.column = pick("Calories");
        let kinds: Vec<ChartKind> = select_charts(&schema(), &sel)
            .iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(kinds, vec![ChartKind::Histogram, ChartKind::CountPlot]);
    }

    #[test]
    fn duplicate_enabled_kinds_emit_once() {
        let mut sel = Selections {
            enabled: vec![ChartKind::CountPlot, ChartKind::CountPlot],
            ..Default::default()
        };
        sel.count_plot.column = pick("Beverage");
        assert_eq!(select_charts(&schema(), &sel).len(), 1);
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let mut sel = Selections {
            enabled: ChartKind::ALL.to_vec(),
            ..Default::default()
        };
        sel.histogram.column = pick("Calories");
        sel.scatter.x = pick("Calories");
        sel.scatter.y = pick("Caffeine (mg)");
        sel.scatter.color = pick("Beverage_prep");
        let s = schema();
        assert_eq!(select_charts(&s, &sel), select_charts(&s, &sel));
    }

    #[test]
    fn reselecting_replaces_previous_output() {
        let s = schema();
        let mut sel = only(ChartKind::Histogram);
        sel.histogram.column = pick("Calories");
        let first = select_charts(&s, &sel);
        sel.histogram.column = pick("Caffeine (mg)");
        let second = select_charts(&s, &sel);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].primary_column, "Caffeine (mg)");
    }

    #[test]
    fn toggle_enables_and_disables() {
        let mut sel = Selections::default();
        sel.toggle(ChartKind::Scatter);
        assert!(sel.is_enabled(ChartKind::Scatter));
        sel.toggle(ChartKind::Scatter);
        assert!(!sel.is_enabled(ChartKind::Scatter));
        sel.set_enabled(ChartKind::BoxPlot, true);
        sel.set_enabled(ChartKind::BoxPlot, true);
        assert_eq!(sel.enabled, vec![ChartKind::BoxPlot]);
    }

    #[test]
    fn title_case_matches_word_rules() {
        assert_eq!(title_case("vitamin a (% dv)"), "Vitamin A (% Dv)");
        assert_eq!(title_case("TOTAL fat"), "Total Fat");
        assert_eq!(title_case("2% milk"), "2% Milk");
        assert_eq!(format_title("beverage_prep"), "Beverage Prep");
    }

    #[test]
    fn selections_from_toml() {
        let sel: Selections = toml::from_str(
            r#"
            enabled = ["histogram", "count_plot"]

            [histogram]
            column = "Calories"
            group_by_category = true
            group_column = "Beverage_category"

            [count_plot]
            column = "Beverage"
            "#,
        )
        .unwrap();
        assert_eq!(sel.enabled, vec![ChartKind::Histogram, ChartKind::CountPlot]);
        assert!(sel.histogram.group_by_category);
        assert_eq!(sel.box_plot, BoxPlotSelection::default());
        assert_eq!(select_charts(&schema(), &sel).len(), 2);
    }
}
