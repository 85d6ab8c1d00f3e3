use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::chart_data::{ChartOptions, CHART_ROW_LIMIT, DEFAULT_HISTOGRAM_BINS};
use crate::chart_export::ChartExportFormat;

const CONFIG_FILE: &str = "config.toml";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Default configuration as TOML with every field commented out,
    /// so defaults stay in effect until the user uncomments a line.
    pub fn generate_default_config(&self) -> Result<String> {
        let toml_str = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
        Ok(comment_all_fields(&toml_str, &collect_all_comments()))
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path(CONFIG_FILE);

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, self.generate_default_config()?)?;

        Ok(config_path)
    }
}

/// Field comments keyed by dotted path, e.g. "chart.histogram_bins".
fn collect_all_comments() -> HashMap<String, String> {
    let sections: [(&str, &[(&str, &str)]); 7] = [
        ("", APP_COMMENTS),
        ("file_loading", FILE_LOADING_COMMENTS),
        ("display", DISPLAY_COMMENTS),
        ("chart", CHART_COMMENTS),
        ("export", EXPORT_COMMENTS),
        ("theme.colors", COLOR_COMMENTS),
        ("debug", DEBUG_COMMENTS),
    ];
    let mut comments = HashMap::new();
    for (section, fields) in sections {
        for (field, comment) in fields {
            let key = if section.is_empty() {
                field.to_string()
            } else {
                format!("{}.{}", section, field)
            };
            comments.insert(key, comment.to_string());
        }
    }
    comments
}

/// Comment out every section header and field, adding the field comments above them.
/// Option fields that serialize to nothing are added back with an example value.
fn comment_all_fields(toml: &str, comments: &HashMap<String, String>) -> String {
    let mut result = String::new();
    result.push_str("# databarista configuration file\n");
    result.push_str("# This file uses TOML format. See https://toml.io/ for syntax reference.\n");
    result.push('\n');

    let mut current_section = String::new();
    let mut seen_fields: HashSet<String> = HashSet::new();

    for line in toml.lines() {
        if let Some(section) = extract_section_name(line) {
            if let Some((_, header)) = SECTION_HEADERS.iter().find(|(s, _)| *s == section) {
                result.push_str(header);
                result.push('\n');
            }
            result.push_str("# ");
            result.push_str(line);
            result.push('\n');
            current_section = section;
            continue;
        }

        if let Some(field_path) = extract_field_path(line, &current_section) {
            push_comment(&mut result, comments.get(&field_path));
            result.push_str("# ");
            result.push_str(line);
            result.push('\n');
            seen_fields.insert(field_path);
        } else {
            result.push_str(line);
            result.push('\n');
        }
    }

    for (field_path, example) in OPTION_FIELDS {
        if seen_fields.contains(*field_path) {
            continue;
        }
        let Some((section, field)) = field_path.rsplit_once('.') else {
            continue;
        };
        let header = format!("# [{}]\n", section);
        let Some(pos) = result.find(&header) else {
            continue;
        };
        let mut block = String::new();
        push_comment(&mut block, comments.get(*field_path));
        block.push_str(&format!("# {} = {}\n", field, example));
        result.insert_str(pos + header.len(), &block);
    }

    result
}

fn push_comment(out: &mut String, comment: Option<&String>) {
    if let Some(comment) = comment {
        for line in comment.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
}

/// Extract section name from TOML line like "[chart]" or "[theme.colors]"
fn extract_section_name(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(trimmed[1..trimmed.len() - 1].to_string())
    } else {
        None
    }
}

fn extract_field_path(line: &str, current_section: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
        return None;
    }
    let (field_name, _) = trimmed.split_once('=')?;
    let field_name = field_name.trim();
    if current_section.is_empty() {
        Some(field_name.to_string())
    } else {
        Some(format!("{}.{}", current_section, field_name))
    }
}

/// Option fields that should appear in the template even when None, with a valid example value
const OPTION_FIELDS: &[(&str, &str)] = &[
    ("file_loading.path", "\"data/cleaned_starbucks.csv\""),
    ("file_loading.delimiter", "44"),
    ("file_loading.has_header", "true"),
    ("file_loading.infer_schema_length", "1000"),
    ("debug.log_file", "\"/tmp/databarista.log\""),
];

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub file_loading: FileLoadingConfig,
    pub display: DisplayConfig,
    pub chart: ChartConfig,
    pub export: ExportConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

const APP_COMMENTS: &[(&str, &str)] = &[(
    "version",
    "Configuration format version (for future compatibility)",
)];

const SECTION_HEADERS: &[(&str, &str)] = &[
    (
        "file_loading",
        "# ============================================================================\n# Dataset Loading\n# ============================================================================",
    ),
    (
        "display",
        "# ============================================================================\n# Display Settings\n# ============================================================================",
    ),
    (
        "chart",
        "# ============================================================================\n# Charts\n# ============================================================================",
    ),
    (
        "export",
        "# ============================================================================\n# Chart Export\n# ============================================================================",
    ),
    (
        "theme",
        "# ============================================================================\n# Color Theme\n# ============================================================================",
    ),
    (
        "theme.colors",
        "# Color definitions\n# Supported formats:\n#   - Named colors: \"red\", \"blue\", \"bright_red\", \"dark_gray\", etc. (case-insensitive)\n#   - Hex colors: \"#ff0000\" or \"#FF0000\" (case-insensitive)\n#   - Indexed colors: \"indexed(0-255)\" for specific xterm 256-color palette entries\n# Colors automatically adapt to your terminal's capabilities",
    ),
    (
        "debug",
        "# ============================================================================\n# Debug Settings\n# ============================================================================",
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FileLoadingConfig {
    /// Dataset path used when none is given on the command line.
    pub path: Option<String>,
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub infer_schema_length: Option<usize>,
}

const FILE_LOADING_COMMENTS: &[(&str, &str)] = &[
    (
        "path",
        "Dataset path used when no PATH argument is given\nUnset: data/cleaned_starbucks.csv",
    ),
    (
        "delimiter",
        "Delimiter for the CSV file (as ASCII value, e.g., 44 for comma)\nUnset: comma",
    ),
    (
        "has_header",
        "Whether the file has a header row\nUnset: true",
    ),
    (
        "infer_schema_length",
        "Number of rows used to infer column types\nUnset: 1000",
    ),
];

impl FileLoadingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.path.is_some() {
            self.path = other.path;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.has_header.is_some() {
            self.has_header = other.has_header;
        }
        if other.infer_schema_length.is_some() {
            self.infer_schema_length = other.infer_schema_length;
        }
    }
}

pub const START_PAGES: [&str; 3] = ["home", "overview", "eda"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Page shown at start-up: "home", "overview" or "eda".
    pub start_page: String,
    pub event_poll_interval_ms: u64,
    pub table_cell_padding: u16,
    /// Show the data dictionary when the Data Overview page first opens.
    pub show_dictionary: bool,
}

const DISPLAY_COMMENTS: &[(&str, &str)] = &[
    (
        "start_page",
        "Page shown at start-up: \"home\", \"overview\" or \"eda\"\nThe --page flag takes precedence",
    ),
    (
        "event_poll_interval_ms",
        "Event polling interval in milliseconds\nLower values = more responsive but higher CPU usage",
    ),
    (
        "table_cell_padding",
        "Number of spaces between columns in the raw data table (0-16)",
    ),
    (
        "show_dictionary",
        "Show the data dictionary when the Data Overview page first opens",
    ),
];

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            start_page: "home".to_string(),
            event_poll_interval_ms: 25,
            table_cell_padding: 2,
            show_dictionary: false,
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.start_page != default.start_page {
            self.start_page = other.start_page;
        }
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
        if other.table_cell_padding != default.table_cell_padding {
            self.table_cell_padding = other.table_cell_padding;
        }
        if other.show_dictionary != default.show_dictionary {
            self.show_dictionary = other.show_dictionary;
        }
    }
}

/// Largest accepted raw-table column spacing.
pub const MAX_TABLE_CELL_PADDING: u16 = 16;

/// Largest accepted histogram bin count.
pub const MAX_HISTOGRAM_BINS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChartConfig {
    /// Maximum rows for chart data. 0 = unlimited.
    pub row_limit: usize,
    pub histogram_bins: usize,
}

const CHART_COMMENTS: &[(&str, &str)] = &[
    (
        "row_limit",
        "Maximum rows used when building charts (display and export)\n0 means unlimited",
    ),
    ("histogram_bins", "Number of histogram bins (1-500)"),
];

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            row_limit: CHART_ROW_LIMIT,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.row_limit != default.row_limit {
            self.row_limit = other.row_limit;
        }
        if other.histogram_bins != default.histogram_bins {
            self.histogram_bins = other.histogram_bins;
        }
    }

    /// Options handed to chart preparation.
    pub fn options(&self) -> ChartOptions {
        ChartOptions {
            histogram_bins: self.histogram_bins,
            row_limit: (self.row_limit > 0).then_some(self.row_limit),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory charts are written to from the EDA page.
    pub dir: String,
    pub format: ChartExportFormat,
    pub width: u32,
    pub height: u32,
}

const EXPORT_COMMENTS: &[(&str, &str)] = &[
    (
        "dir",
        "Directory charts are written to (relative paths resolve against the working directory)",
    ),
    ("format", "Image format: \"png\" or \"svg\""),
    ("width", "Image width in pixels"),
    ("height", "Image height in pixels"),
];

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: "charts".to_string(),
            format: ChartExportFormat::Png,
            width: 1024,
            height: 768,
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ExportConfig::default();
        if other.dir != default.dir {
            self.dir = other.dir;
        }
        if other.format != default.format {
            self.format = other.format;
        }
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        self.colors.merge(other.colors);
    }
}

/// Color configuration for the application theme.
///
/// Colors can be specified as:
/// - Named colors: "cyan", "red", "yellow", etc.
/// - Hex colors: "#ff0000"
/// - Indexed colors: "indexed(236)" for 256-color palette
/// - Special modifiers: "reversed" for selected rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColorConfig {
    pub keybind_hints: String,
    pub keybind_labels: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub table_header: String,
    pub table_header_bg: String,
    pub table_selected: String,
    pub sidebar_border: String,
    pub sidebar_active: String,
    pub focus: String,
    pub success: String,
    pub error: String,
    pub dimmed: String,
    pub chart_series_color_1: String,
    pub chart_series_color_2: String,
    pub chart_series_color_3: String,
    pub chart_series_color_4: String,
    pub chart_series_color_5: String,
    pub chart_series_color_6: String,
    pub chart_series_color_7: String,
}

const COLOR_COMMENTS: &[(&str, &str)] = &[
    ("keybind_hints", "Key names in the controls bar and help line"),
    ("keybind_labels", "Action labels in controls bar"),
    ("controls_bg", "Controls bar background"),
    ("text_primary", "Primary text"),
    ("text_secondary", "Secondary text, placeholders"),
    ("table_header", "Table column header text"),
    ("table_header_bg", "Table column header background"),
    ("table_selected", "Selected row style"),
    ("sidebar_border", "Sidebar and panel borders"),
    ("sidebar_active", "Current page in the sidebar"),
    ("focus", "Focused control on the EDA page"),
    ("success", "Status line after a successful export"),
    ("error", "Error messages"),
    ("dimmed", "Disabled controls, axis lines"),
    ("chart_series_color_1", "First chart series color"),
    ("chart_series_color_2", "Second chart series color"),
    ("chart_series_color_3", "Third chart series color"),
    ("chart_series_color_4", "Fourth chart series color"),
    ("chart_series_color_5", "Fifth chart series color"),
    ("chart_series_color_6", "Sixth chart series color"),
    ("chart_series_color_7", "Seventh chart series color"),
];

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            keybind_hints: "cyan".to_string(),
            keybind_labels: "indexed(252)".to_string(),
            controls_bg: "indexed(235)".to_string(),
            text_primary: "default".to_string(),
            text_secondary: "indexed(240)".to_string(),
            table_header: "white".to_string(),
            table_header_bg: "indexed(235)".to_string(),
            table_selected: "reversed".to_string(),
            sidebar_border: "indexed(238)".to_string(),
            sidebar_active: "#00704a".to_string(),
            focus: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            chart_series_color_1: "cyan".to_string(),
            chart_series_color_2: "magenta".to_string(),
            chart_series_color_3: "green".to_string(),
            chart_series_color_4: "yellow".to_string(),
            chart_series_color_5: "blue".to_string(),
            chart_series_color_6: "red".to_string(),
            chart_series_color_7: "bright_cyan".to_string(),
        }
    }
}

/// Number of chart series colors in the theme.
pub const SERIES_COLORS: usize = 7;

/// Theme key of the n-th chart series color, cycling after the last one.
pub fn series_color_key(n: usize) -> &'static str {
    const KEYS: [&str; SERIES_COLORS] = [
        "chart_series_color_1",
        "chart_series_color_2",
        "chart_series_color_3",
        "chart_series_color_4",
        "chart_series_color_5",
        "chart_series_color_6",
        "chart_series_color_7",
    ];
    KEYS[n % SERIES_COLORS]
}

impl ColorConfig {
    /// (name, value) for every color field, in declaration order.
    pub fn entries(&self) -> [(&'static str, &str); 21] {
        [
            ("keybind_hints", self.keybind_hints.as_str()),
            ("keybind_labels", self.keybind_labels.as_str()),
            ("controls_bg", self.controls_bg.as_str()),
            ("text_primary", self.text_primary.as_str()),
            ("text_secondary", self.text_secondary.as_str()),
            ("table_header", self.table_header.as_str()),
            ("table_header_bg", self.table_header_bg.as_str()),
            ("table_selected", self.table_selected.as_str()),
            ("sidebar_border", self.sidebar_border.as_str()),
            ("sidebar_active", self.sidebar_active.as_str()),
            ("focus", self.focus.as_str()),
            ("success", self.success.as_str()),
            ("error", self.error.as_str()),
            ("dimmed", self.dimmed.as_str()),
            ("chart_series_color_1", self.chart_series_color_1.as_str()),
            ("chart_series_color_2", self.chart_series_color_2.as_str()),
            ("chart_series_color_3", self.chart_series_color_3.as_str()),
            ("chart_series_color_4", self.chart_series_color_4.as_str()),
            ("chart_series_color_5", self.chart_series_color_5.as_str()),
            ("chart_series_color_6", self.chart_series_color_6.as_str()),
            ("chart_series_color_7", self.chart_series_color_7.as_str()),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser.parse(value).map_err(|e| {
                eyre!(
                    "theme.colors.{}: {}. Use a valid color name (e.g. red, cyan, bright_red), \
                     hex (#rrggbb), or indexed(0-255)",
                    name,
                    e
                )
            })?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        macro_rules! take_changed {
            ($($field:ident),* $(,)?) => {
                $(
                    if other.$field != default.$field {
                        self.$field = other.$field;
                    }
                )*
            };
        }
        take_changed!(
            keybind_hints,
            keybind_labels,
            controls_bg,
            text_primary,
            text_secondary,
            table_header,
            table_header_bg,
            table_selected,
            sidebar_border,
            sidebar_active,
            focus,
            success,
            error,
            dimmed,
            chart_series_color_1,
            chart_series_color_2,
            chart_series_color_3,
            chart_series_color_4,
            chart_series_color_5,
            chart_series_color_6,
            chart_series_color_7,
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log at debug level (same as --debug).
    pub enabled: bool,
    /// Log file used by the browser. None = databarista.log in the cache directory.
    pub log_file: Option<String>,
}

const DEBUG_COMMENTS: &[(&str, &str)] = &[
    ("enabled", "Log at debug level (same as --debug)"),
    (
        "log_file",
        "Log file used while the browser runs\nUnset: databarista.log in the cache directory",
    ),
];

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            file_loading: FileLoadingConfig::default(),
            display: DisplayConfig::default(),
            chart: ChartConfig::default(),
            export: ExportConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_from(&ConfigManager::new(app_name)?)
    }

    /// Load defaults merged with `config.toml` from the manager's directory, if present.
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let config_path = manager.config_path(CONFIG_FILE);
        let mut config = AppConfig::default();
        if let Some(user_config) = Self::load_user_config(&config_path)? {
            config.merge(user_config);
        }

        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_path.display(), e))?;

        Ok(config)
    }

    fn load_user_config(config_path: &Path) -> Result<Option<AppConfig>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.file_loading.merge(other.file_loading);
        self.display.merge(other.display);
        self.chart.merge(other.chart);
        self.export.merge(other.export);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if !START_PAGES.contains(&self.display.start_page.as_str()) {
            return Err(eyre!(
                "display.start_page must be one of {}, got \"{}\"",
                START_PAGES.join(", "),
                self.display.start_page
            ));
        }

        if self.display.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.display.table_cell_padding > MAX_TABLE_CELL_PADDING {
            return Err(eyre!(
                "display.table_cell_padding must be between 0 and {}, got {}",
                MAX_TABLE_CELL_PADDING,
                self.display.table_cell_padding
            ));
        }

        if self.chart.histogram_bins == 0 || self.chart.histogram_bins > MAX_HISTOGRAM_BINS {
            return Err(eyre!(
                "chart.histogram_bins must be between 1 and {}, got {}",
                MAX_HISTOGRAM_BINS,
                self.chart.histogram_bins
            ));
        }

        if self.export.width == 0 || self.export.height == 0 {
            return Err(eyre!("export.width and export.height must be greater than 0"));
        }

        if self.export.dir.trim().is_empty() {
            return Err(eyre!("export.dir must not be empty"));
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, indexed or named) and convert to a terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        let lower = trimmed.to_lowercase();
        if let Some(num_str) = lower
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let num = num_str.trim().parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" => Ok(Color::Indexed(8)),
            "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            // Handled by the renderer (e.g. "reversed" selects with a modifier)
            "reset" | "default" | "none" | "reversed" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.is_ascii() || !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let component = |range: std::ops::Range<usize>, name: &str| {
        u8::from_str_radix(&s[range], 16)
            .map_err(|_| eyre!("Invalid {} component in hex color: {}", name, s))
    };
    Ok((
        component(1..3, "red")?,
        component(3..5, "green")?,
        component(5..7, "blue")?,
    ))
}

/// Convert RGB to nearest xterm 256-color palette index
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // grayscale ramp 232-255
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let colors = config
            .colors
            .entries()
            .into_iter()
            .map(|(name, value)| Ok((name.to_string(), parser.parse(value)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

impl Default for Theme {
    fn default() -> Self {
        let parser = ColorParser::new();
        let colors = ColorConfig::default()
            .entries()
            .into_iter()
            .map(|(name, value)| (name.to_string(), parser.parse(value).unwrap_or(Color::Reset)))
            .collect();
        Self { colors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_components() {
        assert_eq!(parse_hex("#00704a").unwrap(), (0, 112, 74));
        assert!(parse_hex("#00704").is_err());
        assert!(parse_hex("#zz704a").is_err());
    }

    #[test]
    fn gray_maps_to_ramp() {
        assert_eq!(rgb_to_256_color(0, 0, 0), 16);
        assert_eq!(rgb_to_256_color(255, 255, 255), 231);
        assert_eq!(rgb_to_256_color(255, 0, 0), 196);
    }

    #[test]
    fn series_color_keys_cycle() {
        assert_eq!(series_color_key(0), "chart_series_color_1");
        assert_eq!(series_color_key(7), "chart_series_color_1");
        assert_eq!(series_color_key(9), "chart_series_color_3");
    }

    #[test]
    fn extract_field_path_in_section() {
        assert_eq!(
            extract_field_path("histogram_bins = 20", "chart"),
            Some("chart.histogram_bins".to_string())
        );
        assert_eq!(extract_field_path("# x = 1", "chart"), None);
        assert_eq!(
            extract_field_path("version = \"0.1\"", ""),
            Some("version".to_string())
        );
    }

    #[test]
    fn option_fields_have_comments() {
        let comments = collect_all_comments();
        for (field, _) in OPTION_FIELDS {
            assert!(comments.contains_key(*field), "{field} has no comment");
        }
    }
}
