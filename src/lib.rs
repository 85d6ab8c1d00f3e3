use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, List, ListItem, Paragraph, Row, StatefulWidget, Table,
    Wrap,
};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod batch;
pub mod cache;
pub mod chart_data;
pub mod chart_export;
pub mod config;
pub mod content;
pub mod dataset;
pub mod dictionary;
pub mod eda_panel;
pub mod error_display;
pub mod logging;
pub mod selector;
pub mod widgets;

pub use cache::CacheManager;
pub use chart_data::{ChartData, ChartOptions};
pub use chart_export::ChartExportFormat;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use databarista_cli::{Args, ExportFormat, Page};
pub use dataset::{ColumnKind, Dataset, LoadError, TableSchema};
pub use selector::{select_charts, ChartKind, ChartRequest, Selections};

use content::ImageRef;
use eda_panel::{EdaFocus, EdaPanel};
use widgets::chart::{render_chart_panel, render_message};
use widgets::controls::Controls;
use widgets::datatable::{DataTable, DataTableState};

/// Application name used for config, cache and log paths
pub const APP_NAME: &str = "databarista";

/// Data file read when neither the command line nor the config names one.
pub const DEFAULT_DATA_PATH: &str = "data/cleaned_starbucks.csv";

const SIDEBAR_WIDTH: u16 = 32;
const EDA_PANEL_WIDTH: u16 = 48;

/// Pages in sidebar order.
pub const PAGES: [Page; 3] = [Page::Home, Page::Overview, Page::Eda];

pub fn page_title(page: Page) -> &'static str {
    match page {
        Page::Home => "Home",
        Page::Overview => "Data Overview",
        Page::Eda => "Exploratory Data Analysis",
    }
}

/// Start page from the CLI, then `display.start_page`, then Home.
pub fn start_page(cli: Option<Page>, config: &AppConfig) -> Page {
    cli.or_else(|| Page::from_str(&config.display.start_page, true).ok())
        .unwrap_or_default()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub infer_schema_length: Option<usize>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Create OpenOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        Self {
            delimiter: args.delimiter.or(config.file_loading.delimiter),
            has_header: config.file_loading.has_header,
            infer_schema_length: args
                .infer_schema_length
                .or(config.file_loading.infer_schema_length),
        }
    }
}

/// Data file path: CLI argument, then `file_loading.path`, then [`DEFAULT_DATA_PATH`].
pub fn resolve_data_path(args: &Args, config: &AppConfig) -> PathBuf {
    args.path
        .clone()
        .or_else(|| config.file_loading.path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16), // resized (width, height)
    Export,           // Internal event to write charts after the UI shows "Exporting"
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Data Overview toggles and table scroll state.
#[derive(Debug, Default)]
pub struct OverviewState {
    pub show_dictionary: bool,
    pub show_table: bool,
    pub show_shape: bool,
    pub table: DataTableState,
}

/// A request with its prepared data, or the message to show instead.
struct PreparedChart {
    request: ChartRequest,
    data: Result<ChartData, String>,
}

pub struct App {
    dataset: Arc<Dataset>,
    config: AppConfig,
    theme: Theme,
    page: Page,
    show_help: bool,
    overview: OverviewState,
    eda: EdaPanel,
    charts: Vec<PreparedChart>,
    status: Option<Status>,
}

impl App {
    pub fn new(dataset: Arc<Dataset>, config: AppConfig, theme: Theme, page: Page) -> Self {
        let (rows, cols) = dataset.shape();
        let overview = OverviewState {
            show_dictionary: config.display.show_dictionary,
            table: DataTableState::new(rows, cols),
            ..OverviewState::default()
        };
        let eda = EdaPanel::new(dataset.schema());
        Self {
            dataset,
            config,
            theme,
            page,
            show_help: false,
            overview,
            eda,
            charts: Vec::new(),
            status: None,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn overview(&self) -> &OverviewState {
        &self.overview
    }

    pub fn eda(&self) -> &EdaPanel {
        &self.eda
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Requests for the charts currently shown on the EDA page.
    pub fn requests(&self) -> Vec<&ChartRequest> {
        self.charts.iter().map(|c| &c.request).collect()
    }

    pub fn chart_options(&self) -> ChartOptions {
        self.config.chart.options()
    }

    /// Handle one event. May return a follow-up event for the loop to send.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Export => {
                self.export_charts();
                None
            }
            AppEvent::Resize(_, _) => None,
            AppEvent::Exit => None,
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        match event.code {
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppEvent::Exit)
            }
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                    return None;
                }
                return Some(AppEvent::Exit);
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                return None;
            }
            KeyCode::Tab => {
                self.set_page(PAGES[(self.page_index() + 1) % PAGES.len()]);
                return None;
            }
            KeyCode::BackTab => {
                self.set_page(PAGES[(self.page_index() + PAGES.len() - 1) % PAGES.len()]);
                return None;
            }
            KeyCode::Char(c @ '1'..='3') => {
                let idx = c as usize - '1' as usize;
                self.set_page(PAGES[idx]);
                return None;
            }
            _ => {}
        }
        match self.page {
            Page::Home => None,
            Page::Overview => {
                self.overview_key(event.code);
                None
            }
            Page::Eda => self.eda_key(event.code),
        }
    }

    fn page_index(&self) -> usize {
        PAGES.iter().position(|p| *p == self.page).unwrap_or(0)
    }

    fn set_page(&mut self, page: Page) {
        if page != self.page {
            debug!(page = page_title(page), "page changed");
            self.page = page;
        }
    }

    fn overview_key(&mut self, code: KeyCode) {
        let o = &mut self.overview;
        match code {
            KeyCode::Char('d') => o.show_dictionary = !o.show_dictionary,
            KeyCode::Char('t') => o.show_table = !o.show_table,
            KeyCode::Char('s') => o.show_shape = !o.show_shape,
            _ if !o.show_table => {}
            KeyCode::Down | KeyCode::Char('j') => o.table.select_next(),
            KeyCode::Up | KeyCode::Char('k') => o.table.select_previous(),
            KeyCode::PageDown => o.table.page_down(),
            KeyCode::PageUp => o.table.page_up(),
            KeyCode::Home => o.table.scroll_to_start(),
            KeyCode::End => o.table.scroll_to_end(),
            KeyCode::Right | KeyCode::Char('l') => o.table.scroll_right(),
            KeyCode::Left | KeyCode::Char('h') => o.table.scroll_left(),
            _ => {}
        }
    }

    fn eda_key(&mut self, code: KeyCode) -> Option<AppEvent> {
        if code == KeyCode::Char('e') {
            if self.charts.is_empty() {
                self.status = Some(Status::Error(
                    "Nothing to export: select a chart first".to_string(),
                ));
                return None;
            }
            self.status = Some(Status::Info("Exporting charts...".to_string()));
            return Some(AppEvent::Export);
        }
        if self.eda.handle_key(code) {
            self.refresh_charts();
        }
        None
    }

    /// Re-run the selector over the current picks and prepare each chart from scratch.
    fn refresh_charts(&mut self) {
        let requests = select_charts(self.dataset.schema(), self.eda.selections());
        let options = self.chart_options();
        self.charts = requests
            .into_iter()
            .map(|request| {
                let data = chart_data::prepare(&self.dataset, &request, &options).map_err(|e| {
                    warn!(title = %request.title, error = %e, "chart data preparation failed");
                    error_display::user_message_from_report(&e)
                });
                PreparedChart { request, data }
            })
            .collect();
        self.status = None;
    }

    fn export_charts(&mut self) {
        let requests: Vec<ChartRequest> = self.charts.iter().map(|c| c.request.clone()).collect();
        let dir = PathBuf::from(&self.config.export.dir);
        match chart_export::export_requests(
            &dir,
            &requests,
            &self.dataset,
            &self.chart_options(),
            self.config.export.format,
            self.config.export.size(),
        ) {
            Ok(paths) => {
                info!(count = paths.len(), dir = %dir.display(), "exported charts");
                self.status = Some(Status::Info(format!(
                    "Exported {} chart(s) to {}",
                    paths.len(),
                    dir.display()
                )));
            }
            Err(e) => {
                warn!(error = %e, "chart export failed");
                self.status = Some(Status::Error(error_display::user_message_from_report(&e)));
            }
        }
    }

    fn help_text(&self) -> &'static str {
        match self.page {
            Page::Home => content::help_home(),
            Page::Overview => content::help_overview(),
            Page::Eda => content::help_eda(),
        }
    }

    fn controls(&self) -> Vec<(&'static str, &'static str)> {
        let mut controls = vec![("Tab", "Page")];
        match self.page {
            Page::Home => {}
            Page::Overview => controls.extend([
                ("d", "Dictionary"),
                ("t", "Table"),
                ("s", "Shape"),
            ]),
            Page::Eda => controls.extend([
                ("↑↓", "Move"),
                ("Space", "Toggle"),
                ("←→", "Column"),
                ("e", "Export"),
            ]),
        }
        controls.extend([("?", "Help"), ("q", "Quit")]);
        controls
    }

    fn render_sidebar(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.get("sidebar_border")))
            .title(" Select a Page ");
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(PAGES.len() as u16), Constraint::Fill(1)])
            .split(inner);

        let items: Vec<ListItem> = PAGES
            .iter()
            .enumerate()
            .map(|(i, page)| {
                let text = format!("{} {}", i + 1, page_title(*page));
                let style = if *page == self.page {
                    Style::default()
                        .fg(self.theme.get("sidebar_active"))
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(self.theme.get("text_primary"))
                };
                ListItem::new(Line::from(Span::styled(text, style)))
            })
            .collect();
        Widget::render(List::new(items), layout[0], buf);

        let source = self
            .dataset
            .source()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (rows, cols) = self.dataset.shape();
        let dimmed = Style::default().fg(self.theme.get("dimmed"));
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(source, dimmed)),
            Line::from(Span::styled(format!("{rows} rows x {cols} columns"), dimmed)),
        ])
        .wrap(Wrap { trim: true })
        .render(layout[1], buf);
    }

    fn heading(&self, text: &str) -> Line<'static> {
        Line::from(Span::styled(
            text.to_string(),
            Style::default()
                .fg(self.theme.get("text_primary"))
                .add_modifier(Modifier::BOLD),
        ))
    }

    fn image_lines(&self, image: &ImageRef) -> Vec<Line<'static>> {
        vec![
            Line::from(Span::styled(
                format!("[image] {}", image.caption),
                Style::default()
                    .fg(self.theme.get("text_secondary"))
                    .add_modifier(Modifier::ITALIC),
            )),
            Line::from(Span::styled(
                format!("        {}", image.url),
                Style::default().fg(self.theme.get("dimmed")),
            )),
        ]
    }

    fn render_home(&self, area: Rect, buf: &mut Buffer) {
        let secondary = Style::default().fg(self.theme.get("text_secondary"));
        let mut lines = vec![
            Line::from(Span::styled(content::NAV_HINT, secondary)),
            Line::from(""),
            self.heading(content::APP_TITLE),
            Line::from(Span::styled(
                content::HOME_SUBTITLE,
                secondary.add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(content::home().lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
        lines.extend(self.image_lines(&content::LOGO));
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }

    fn render_overview(&mut self, area: Rect, buf: &mut Buffer) {
        let check = |on: bool| if on { "[x]" } else { "[ ]" };
        let key_style = Style::default().fg(self.theme.get("keybind_hints"));
        let label_style = Style::default().fg(self.theme.get("text_primary"));
        let toggles = Line::from(vec![
            Span::styled(format!("{} ", check(self.overview.show_dictionary)), label_style),
            Span::styled("d ", key_style),
            Span::styled("Show Data Dictionary   ", label_style),
            Span::styled(format!("{} ", check(self.overview.show_table)), label_style),
            Span::styled("t ", key_style),
            Span::styled("Show DataFrame   ", label_style),
            Span::styled(format!("{} ", check(self.overview.show_shape)), label_style),
            Span::styled("s ", key_style),
            Span::styled("Show Shape of Data", label_style),
        ]);

        let mut header = vec![
            self.heading(content::OVERVIEW_TITLE),
            Line::from(""),
            self.heading("About the Data"),
        ];
        header.extend(content::about().lines().map(|l| Line::from(l.to_string())));
        header.push(Line::from(""));
        header.extend(self.image_lines(&content::MOTTO));
        header.push(Line::from(""));
        header.push(self.heading("Quick Glance at the Data"));
        header.push(toggles);
        if self.overview.show_shape {
            header.push(Line::from(content::shape_line(self.dataset.shape())));
        }

        // Leave room for wrapped paragraphs.
        let header_height = (header.len() as u16 + 3).min(area.height);
        let mut constraints = vec![Constraint::Length(header_height)];
        if self.overview.show_dictionary {
            constraints.push(Constraint::Fill(1));
        }
        if self.overview.show_table {
            constraints.push(Constraint::Fill(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        Paragraph::new(header)
            .wrap(Wrap { trim: false })
            .render(layout[0], buf);

        let mut next = 1;
        if self.overview.show_dictionary {
            self.render_dictionary(layout[next], buf);
            next += 1;
        }
        if self.overview.show_table {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(self.theme.get("sidebar_border")))
                .title(" DataFrame ");
            let inner = block.inner(layout[next]);
            block.render(layout[next], buf);
            let selected = self.theme.get("table_selected");
            DataTable::new(&self.dataset)
                .with_colors(
                    self.theme.get("table_header_bg"),
                    self.theme.get("table_header"),
                    self.theme.get("text_primary"),
                )
                .with_selected_style(
                    Style::default()
                        .fg(selected)
                        .add_modifier(Modifier::REVERSED),
                )
                .with_cell_padding(self.config.display.table_cell_padding)
                .render(inner, buf, &mut self.overview.table);
        }
    }

    fn render_dictionary(&self, area: Rect, buf: &mut Buffer) {
        let entries = dictionary::entries(self.dataset.schema());
        let header_style = Style::default()
            .fg(self.theme.get("table_header"))
            .bg(self.theme.get("table_header_bg"))
            .add_modifier(Modifier::BOLD);
        let column_width = entries
            .iter()
            .map(|e| e.column.chars().count())
            .max()
            .unwrap_or(6)
            .max(6) as u16;
        let rows: Vec<Row> = entries
            .iter()
            .map(|e| {
                Row::new(vec![
                    Cell::from(e.column.clone()),
                    Cell::from(e.type_label.clone()),
                    Cell::from(e.description.clone()),
                ])
            })
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.get("sidebar_border")))
            .title(" Data Dictionary ")
            .title_bottom(Line::from(format!(" {} ", content::DATASET_DESCRIPTION)));
        Widget::render(
            Table::new(
                rows,
                [
                    Constraint::Length(column_width),
                    Constraint::Length(8),
                    Constraint::Fill(1),
                ],
            )
            .header(Row::new(vec!["Column", "Type", "Description"]).style(header_style))
            .block(block),
            area,
            buf,
        );
    }

    fn render_eda(&self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(EDA_PANEL_WIDTH), Constraint::Fill(1)])
            .split(area);
        self.render_eda_panel(layout[0], buf);

        let chart_area = layout[1];
        if self.charts.is_empty() {
            let message = if self.eda.selections().enabled.is_empty() {
                "Enable a visualization option to get started"
            } else {
                "Pick columns to draw a chart"
            };
            render_message(chart_area, buf, &self.theme, message);
            return;
        }
        let constraints: Vec<Constraint> =
            self.charts.iter().map(|_| Constraint::Fill(1)).collect();
        let areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(chart_area);
        for (chart, rect) in self.charts.iter().zip(areas.iter()) {
            match &chart.data {
                Ok(data) => render_chart_panel(*rect, buf, &self.theme, &chart.request.title, data),
                Err(message) => {
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(self.theme.get("error")))
                        .title(format!(" {} ", chart.request.title));
                    let inner = block.inner(*rect);
                    block.render(*rect, buf);
                    Paragraph::new(message.as_str())
                        .style(Style::default().fg(self.theme.get("error")))
                        .wrap(Wrap { trim: true })
                        .render(inner, buf);
                }
            }
        }
    }

    fn render_eda_panel(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.get("sidebar_border")))
            .title(format!(" {} ", content::EDA_TITLE));
        let inner = block.inner(area);
        block.render(area, buf);

        let focus_style = Style::default()
            .fg(self.theme.get("focus"))
            .add_modifier(Modifier::BOLD);
        let label_style = Style::default().fg(self.theme.get("text_primary"));
        let value_style = Style::default().fg(self.theme.get("text_secondary"));

        let mut lines = vec![
            self.heading(content::EDA_SUBTITLE),
            Line::from(""),
            Line::from(Span::styled("Visualization Options", label_style)),
        ];
        let focused = self.eda.focused();
        let mut section = None;
        for control in self.eda.controls() {
            let is_focused = control == focused;
            let marker = if is_focused { "> " } else { "  " };
            match control {
                EdaFocus::Kind(_) | EdaFocus::HistGroupToggle => {
                    let style = if is_focused { focus_style } else { label_style };
                    lines.push(Line::from(vec![
                        Span::styled(marker, focus_style),
                        Span::styled(format!("{} ", self.eda.value_display(control)), style),
                        Span::styled(control.label(), style),
                    ]));
                }
                _ => {
                    if section != Some(control.section()) {
                        section = Some(control.section());
                        lines.push(Line::from(""));
                        lines.push(self.heading(control.section().heading()));
                    }
                    let style = if is_focused { focus_style } else { label_style };
                    lines.push(Line::from(vec![
                        Span::styled(marker, focus_style),
                        Span::styled(control.label(), style),
                    ]));
                    lines.push(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(
                            format!("< {} >", self.eda.value_display(control)),
                            if is_focused { focus_style } else { value_style },
                        ),
                    ]));
                }
            }
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let help_height = if self.show_help {
            self.help_text().lines().count() as u16 + 2
        } else {
            0
        };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(help_height),
                Constraint::Length(1), // Controls
            ])
            .split(area);
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
            .split(layout[0]);

        self.render_sidebar(main[0], buf);
        let page_area = main[1].inner(ratatui::layout::Margin::new(1, 0));
        match self.page {
            Page::Home => self.render_home(page_area, buf),
            Page::Overview => self.render_overview(page_area, buf),
            Page::Eda => self.render_eda(page_area, buf),
        }

        if self.show_help {
            Paragraph::new(self.help_text())
                .style(Style::default().fg(self.theme.get("text_primary")))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(self.theme.get("focus")))
                        .title(" Help "),
                )
                .render(layout[1], buf);
        }

        let (status, status_color) = match &self.status {
            Some(Status::Info(s)) => (Some(s.clone()), self.theme.get("success")),
            Some(Status::Error(s)) => (Some(s.clone()), self.theme.get("error")),
            None => (None, self.theme.get("text_primary")),
        };
        let controls = Controls::new(self.controls())
            .with_status(status)
            .with_colors(
                self.theme.get("controls_bg"),
                self.theme.get("keybind_hints"),
                self.theme.get("keybind_labels"),
            )
            .with_status_color(status_color);
        (&controls).render(layout[2], buf);
    }
}
