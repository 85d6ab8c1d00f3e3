use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::dataset::{ColumnKind, Dataset};

/// Scroll position of the raw data table.
#[derive(Debug, Default, Clone)]
pub struct DataTableState {
    /// First row shown.
    pub start_row: usize,
    /// First column shown.
    pub start_col: usize,
    /// Rows that fit in the last rendered area (set during render).
    pub visible_rows: usize,
    num_rows: usize,
    num_cols: usize,
    table_state: TableState,
}

impl DataTableState {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            table_state: TableState::default().with_selected(if num_rows > 0 {
                Some(0)
            } else {
                None
            }),
            ..Self::default()
        }
    }

    /// Absolute index of the selected row.
    pub fn selected_row(&self) -> Option<usize> {
        self.table_state.selected().map(|i| self.start_row + i)
    }

    pub fn select_next(&mut self) {
        let Some(selected) = self.selected_row() else {
            return;
        };
        self.select_row(selected + 1);
    }

    pub fn select_previous(&mut self) {
        let Some(selected) = self.selected_row() else {
            return;
        };
        self.select_row(selected.saturating_sub(1));
    }

    pub fn page_down(&mut self) {
        let step = self.visible_rows.max(1);
        if let Some(selected) = self.selected_row() {
            self.select_row(selected + step);
        }
    }

    pub fn page_up(&mut self) {
        let step = self.visible_rows.max(1);
        if let Some(selected) = self.selected_row() {
            self.select_row(selected.saturating_sub(step));
        }
    }

    pub fn scroll_to_start(&mut self) {
        self.select_row(0);
    }

    pub fn scroll_to_end(&mut self) {
        self.select_row(self.num_rows.saturating_sub(1));
    }

    pub fn scroll_right(&mut self) {
        if self.start_col + 1 < self.num_cols {
            self.start_col += 1;
        }
    }

    pub fn scroll_left(&mut self) {
        self.start_col = self.start_col.saturating_sub(1);
    }

    /// Select an absolute row, sliding the window so it stays visible.
    fn select_row(&mut self, row: usize) {
        if self.num_rows == 0 {
            return;
        }
        let row = row.min(self.num_rows - 1);
        let window = self.visible_rows.max(1);
        if row < self.start_row {
            self.start_row = row;
        } else if row >= self.start_row + window {
            self.start_row = row + 1 - window;
        }
        self.table_state.select(Some(row - self.start_row));
    }
}

/// Renders a window of the dataset as a table. Numeric cells are right-aligned.
pub struct DataTable<'a> {
    dataset: &'a Dataset,
    pub header_bg: Color,
    pub header_fg: Color,
    pub selected_style: Style,
    pub numeric_fg: Color,
    pub table_cell_padding: u16,
}

impl<'a> DataTable<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            header_bg: Color::Indexed(236),
            header_fg: Color::White,
            selected_style: Style::default().add_modifier(Modifier::REVERSED),
            numeric_fg: Color::Reset,
            table_cell_padding: 1,
        }
    }

    pub fn with_colors(mut self, header_bg: Color, header_fg: Color, numeric_fg: Color) -> Self {
        self.header_bg = header_bg;
        self.header_fg = header_fg;
        self.numeric_fg = numeric_fg;
        self
    }

    pub fn with_selected_style(mut self, style: Style) -> Self {
        self.selected_style = style;
        self
    }

    pub fn with_cell_padding(mut self, padding: u16) -> Self {
        self.table_cell_padding = padding;
        self
    }
}

impl StatefulWidget for DataTable<'_> {
    type State = DataTableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut DataTableState) {
        let (height, cols) = self.dataset.shape();
        state.num_rows = height;
        state.num_cols = cols;
        state.visible_rows = area.height.saturating_sub(1) as usize;
        state.start_col = state.start_col.min(cols.saturating_sub(1));
        let end_row = (state.start_row + state.visible_rows).min(height);
        let columns = self.dataset.columns();

        // Each column is as wide as its header or widest visible cell.
        let mut widths: Vec<u16> = Vec::new();
        let mut used_width = 0u16;
        let mut visible_cols = Vec::new();
        for col in state.start_col..cols {
            let mut width = columns[col].name.chars().count() as u16;
            for row in state.start_row..end_row {
                width = width.max(self.dataset.cell_display(row, col).chars().count() as u16);
            }
            if used_width.saturating_add(width) > area.width {
                // Clip the first column rather than show nothing.
                if visible_cols.is_empty() {
                    widths.push(area.width);
                    visible_cols.push(col);
                }
                break;
            }
            used_width = used_width
                .saturating_add(width)
                .saturating_add(self.table_cell_padding);
            widths.push(width);
            visible_cols.push(col);
        }

        let header = Row::new(visible_cols.iter().map(|c| {
            Cell::from(Span::styled(
                columns[*c].name.as_str(),
                Style::default()
                    .fg(self.header_fg)
                    .add_modifier(Modifier::BOLD),
            ))
        }))
        .style(Style::default().bg(self.header_bg));

        let rows: Vec<Row> = (state.start_row..end_row)
            .map(|row| {
                Row::new(visible_cols.iter().zip(widths.iter()).map(|(c, w)| {
                    let text = self.dataset.cell_display(row, *c);
                    match columns[*c].kind {
                        ColumnKind::Numeric => Cell::from(
                            Line::from(format!("{:>width$}", text, width = *w as usize))
                                .style(Style::default().fg(self.numeric_fg)),
                        ),
                        ColumnKind::Categorical => Cell::from(text),
                    }
                }))
            })
            .collect();

        let constraints: Vec<Constraint> = widths.iter().map(|w| Constraint::Length(*w)).collect();
        let table = Table::new(rows, constraints)
            .header(header)
            .column_spacing(self.table_cell_padding)
            .row_highlight_style(self.selected_style);
        if height == 0 {
            Widget::render(table, area, buf);
            return;
        }
        StatefulWidget::render(table, area, buf, &mut state.table_state);
    }
}
