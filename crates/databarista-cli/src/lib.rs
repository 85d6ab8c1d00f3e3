//! Shared CLI definitions for databarista.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Page shown when the browser starts.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum Page {
    /// Welcome page with navigation hints
    #[default]
    Home,
    /// Data dictionary, raw table and shape
    Overview,
    /// Exploratory data analysis charts
    Eda,
}

/// Image format for exported charts
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    /// Portable Network Graphics bitmap
    #[default]
    Png,
    /// Scalable Vector Graphics
    Svg,
}

/// Command-line arguments for databarista
#[derive(Clone, Parser, Debug)]
#[command(
    name = "databarista",
    version,
    about = "Browse and chart the Starbucks beverage nutrition dataset in the terminal",
    long_about = "Browse and chart the Starbucks beverage nutrition dataset in the terminal.\n\n\
                  Without --charts an interactive browser starts with three pages: Home, \
                  Data Overview and Exploratory Data Analysis. With --charts a TOML selection \
                  file is turned into chart requests that can be printed as JSON or exported \
                  as images."
)]
pub struct Args {
    /// Path to the beverage CSV file (default: config file_loading.path, then data/cleaned_starbucks.csv)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Delimiter used in the CSV file, as a single ASCII byte value (e.g. 59 for ';')
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Number of rows to use when inferring column types (default: 1000)
    #[arg(long = "infer-schema-length", value_name = "N")]
    pub infer_schema_length: Option<usize>,

    /// Page to open first
    #[arg(long = "page", value_enum)]
    pub page: Option<Page>,

    /// Run without the browser: read chart selections from this TOML file
    #[arg(long = "charts", value_name = "FILE")]
    pub charts: Option<PathBuf>,

    /// With --charts, print the resulting chart requests as JSON on stdout (default when --export-dir is absent)
    #[arg(long = "print-requests", requires = "charts", action)]
    pub print_requests: bool,

    /// With --charts, write one image per chart request into this directory
    #[arg(long = "export-dir", value_name = "DIR", requires = "charts")]
    pub export_dir: Option<PathBuf>,

    /// Image format for exported charts (default: config export.format, then png)
    #[arg(long = "export-format", value_enum)]
    pub export_format: Option<ExportFormat>,

    /// Enable debug logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write logs to this file instead of the cache directory
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Remove cached files (logs) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/databarista/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

impl Args {
    /// True when the run produces output without starting the browser.
    pub fn is_batch(&self) -> bool {
        self.charts.is_some()
    }
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_batch() {
        let args = Args::try_parse_from([
            "databarista",
            "drinks.csv",
            "--charts",
            "charts.toml",
            "--print-requests",
            "--export-format",
            "svg",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("drinks.csv")));
        assert!(args.is_batch());
        assert!(args.print_requests);
        assert_eq!(args.export_format, Some(ExportFormat::Svg));
    }

    #[test]
    fn test_print_requests_requires_charts() {
        assert!(Args::try_parse_from(["databarista", "--print-requests"]).is_err());
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["databarista", "--force"]).is_err());
        assert!(Args::try_parse_from(["databarista", "--generate-config", "--force"]).is_ok());
    }

    #[test]
    fn test_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("--charts"));
        assert!(md.contains("--export-dir"));
        assert!(md.contains("[<PATH>]"));
    }
}
