//! Non-interactive runs: a TOML selections file in, chart requests (JSON) and images out.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chart_data::ChartOptions;
use crate::chart_export::{export_requests, ChartExportFormat};
use crate::dataset::Dataset;
use crate::selector::{select_charts, ChartRequest, Selections};

/// Read a [`Selections`] value from a TOML file.
///
/// Parse errors name the file, the line, and the TOML reason on a single line.
pub fn load_selections(path: &Path) -> Result<Selections> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre!("Cannot read selections file {}: {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| {
        let line = e
            .span()
            .and_then(|span| text.get(..span.start))
            .map(|before| before.matches('\n').count() + 1);
        match line {
            Some(line) => eyre!(
                "Invalid selections file {} (line {}): {}",
                path.display(),
                line,
                e.message()
            ),
            None => eyre!("Invalid selections file {}: {}", path.display(), e.message()),
        }
    })
}

/// What a batch run should produce.
pub struct BatchPlan {
    pub print_requests: bool,
    pub export_dir: Option<PathBuf>,
    pub format: ChartExportFormat,
    pub size: (u32, u32),
    pub options: ChartOptions,
}

/// Run the selector and produce the planned outputs. Returns the requests.
pub fn run<W: Write>(
    dataset: &Dataset,
    selections: &Selections,
    plan: &BatchPlan,
    out: &mut W,
) -> Result<Vec<ChartRequest>> {
    let requests = select_charts(dataset.schema(), selections);
    info!(count = requests.len(), "chart requests selected");

    if plan.print_requests {
        serde_json::to_writer_pretty(&mut *out, &requests)?;
        writeln!(out)?;
    }

    if let Some(dir) = &plan.export_dir {
        let written = export_requests(
            dir,
            &requests,
            dataset,
            &plan.options,
            plan.format,
            plan.size,
        )?;
        for path in written {
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_display::user_message_from_report;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn dataset() -> Dataset {
        let df = df!(
            "Beverage_category" => ["Coffee", "Tea"],
            "Calories" => [3i64, 210],
            "Sugars (g)" => [0.0f64, 40.0],
        )
        .unwrap();
        Dataset::from_frame(&df).unwrap()
    }

    fn plan(print_requests: bool) -> BatchPlan {
        BatchPlan {
            print_requests,
            export_dir: None,
            format: ChartExportFormat::Svg,
            size: (640, 480),
            options: ChartOptions::default(),
        }
    }

    #[test]
    fn loads_selections_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("charts.toml");
        std::fs::write(
            &path,
            "enabled = [\"scatter\"]\n[scatter]\nx = \"Calories\"\ny = \"Sugars (g)\"\ncolor = \"Beverage_category\"\n",
        )
        .unwrap();
        let selections = load_selections(&path).unwrap();
        assert!(selections.is_enabled(crate::selector::ChartKind::Scatter));
        assert_eq!(selections.scatter.y.as_deref(), Some("Sugars (g)"));
    }

    #[test]
    fn missing_or_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_selections(&dir.path().join("absent.toml")).is_err());
        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "enabled = [\"pie\"]\n").unwrap();
        assert!(load_selections(&bad).is_err());
    }

    #[test]
    fn invalid_file_message_carries_toml_reason() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "# charts\nenabled = [\"pie\"]\n").unwrap();

        let err = load_selections(&bad).unwrap_err();

        let message = user_message_from_report(&err);
        assert!(message.contains("bad.toml"), "{message}");
        assert!(message.contains("pie"), "{message}");
        assert!(!message.contains('\n'));
    }

    #[test]
    fn prints_requests_as_json() {
        let mut selections = Selections::default();
        selections.set_enabled(crate::selector::ChartKind::Histogram, true);
        selections.histogram.column = Some("Calories".to_string());
        let mut out = Vec::new();
        let requests = run(&dataset(), &selections, &plan(true), &mut out).unwrap();
        assert_eq!(requests.len(), 1);
        let printed: Vec<ChartRequest> = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, requests);
    }

    #[test]
    fn nothing_selected_prints_empty_list() {
        let mut out = Vec::new();
        let requests = run(&dataset(), &Selections::default(), &plan(true), &mut out).unwrap();
        assert!(requests.is_empty());
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
    }
}
