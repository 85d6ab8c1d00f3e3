//! EDA page state: chart kind toggles and per-kind column pickers.

use crossterm::event::KeyCode;

use crate::dataset::{ColumnKind, TableSchema};
use crate::selector::{ChartKind, Selections};

/// One focusable control on the EDA page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdaFocus {
    Kind(ChartKind),
    HistColumn,
    HistGroupToggle,
    HistGroupColumn,
    BoxColumn,
    BoxCategory,
    ScatterX,
    ScatterY,
    ScatterColor,
    CountColumn,
}

impl EdaFocus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Kind(kind) => kind.as_str(),
            Self::HistColumn => "Select a numerical column for the histogram:",
            Self::HistGroupToggle => "Show by Category",
            Self::HistGroupColumn | Self::BoxCategory | Self::ScatterColor => {
                "Select a categorical column for coloring:"
            }
            Self::BoxColumn => "Select a numerical column for the box plot:",
            Self::ScatterX => "Select x-axis variable:",
            Self::ScatterY => "Select y-axis variable:",
            Self::CountColumn => "Select a categorical variable:",
        }
    }

    /// Column type offered by a picker; `None` for toggles.
    pub fn picker_kind(self) -> Option<ColumnKind> {
        match self {
            Self::Kind(_) | Self::HistGroupToggle => None,
            Self::HistColumn | Self::BoxColumn | Self::ScatterX | Self::ScatterY => {
                Some(ColumnKind::Numeric)
            }
            Self::HistGroupColumn | Self::BoxCategory | Self::ScatterColor | Self::CountColumn => {
                Some(ColumnKind::Categorical)
            }
        }
    }

    /// Chart kind whose section holds this control.
    pub fn section(self) -> ChartKind {
        match self {
            Self::Kind(kind) => kind,
            Self::HistColumn | Self::HistGroupToggle | Self::HistGroupColumn => {
                ChartKind::Histogram
            }
            Self::BoxColumn | Self::BoxCategory => ChartKind::BoxPlot,
            Self::ScatterX | Self::ScatterY | Self::ScatterColor => ChartKind::Scatter,
            Self::CountColumn => ChartKind::CountPlot,
        }
    }
}

/// Picker state for the EDA page. Owns the [`Selections`] handed to the selector.
pub struct EdaPanel {
    selections: Selections,
    numeric: Vec<String>,
    categorical: Vec<String>,
    focus: usize,
}

impl EdaPanel {
    pub fn new(schema: &TableSchema) -> Self {
        Self {
            selections: Selections::default(),
            numeric: owned(schema.columns_by_type(ColumnKind::Numeric)),
            categorical: owned(schema.columns_by_type(ColumnKind::Categorical)),
            focus: 0,
        }
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    /// Visible controls in focus order: kind toggles, then the pickers of each enabled kind.
    pub fn controls(&self) -> Vec<EdaFocus> {
        let mut out: Vec<EdaFocus> = ChartKind::ALL.iter().map(|k| EdaFocus::Kind(*k)).collect();
        for kind in ChartKind::ALL {
            if !self.selections.is_enabled(kind) {
                continue;
            }
            match kind {
                ChartKind::Histogram => {
                    out.push(EdaFocus::HistColumn);
                    out.push(EdaFocus::HistGroupToggle);
                    if self.selections.histogram.group_by_category {
                        out.push(EdaFocus::HistGroupColumn);
                    }
                }
                ChartKind::BoxPlot => {
                    out.push(EdaFocus::BoxColumn);
                    out.push(EdaFocus::BoxCategory);
                }
                ChartKind::Scatter => {
                    out.push(EdaFocus::ScatterX);
                    out.push(EdaFocus::ScatterY);
                    out.push(EdaFocus::ScatterColor);
                }
                ChartKind::CountPlot => out.push(EdaFocus::CountColumn),
            }
        }
        out
    }

    pub fn focused(&self) -> EdaFocus {
        let controls = self.controls();
        controls[self.focus.min(controls.len() - 1)]
    }

    pub fn focus_index(&self) -> usize {
        self.focus.min(self.controls().len() - 1)
    }

    pub fn focus_next(&mut self) {
        let len = self.controls().len();
        self.focus = (self.focus_index() + 1) % len;
    }

    pub fn focus_prev(&mut self) {
        let len = self.controls().len();
        self.focus = (self.focus_index() + len - 1) % len;
    }

    /// Space on a toggle. Returns true when the selections changed.
    pub fn toggle_focused(&mut self) -> bool {
        let focused = self.focused();
        match focused {
            EdaFocus::Kind(kind) => {
                self.selections.toggle(kind);
                true
            }
            EdaFocus::HistGroupToggle => {
                let h = &mut self.selections.histogram;
                h.group_by_category = !h.group_by_category;
                true
            }
            _ => false,
        }
    }

    /// Move the focused picker to the next (or previous) column of its type.
    /// The unset position sits before the first column. Returns true when the selections changed.
    pub fn cycle_focused(&mut self, forward: bool) -> bool {
        let focused = self.focused();
        let Some(kind) = focused.picker_kind() else {
            return false;
        };
        let options = match kind {
            ColumnKind::Numeric => self.numeric.clone(),
            ColumnKind::Categorical => self.categorical.clone(),
        };
        if options.is_empty() {
            return false;
        }
        let Some(slot) = self.slot_mut(focused) else {
            return false;
        };
        // Position 0 is "unset"; column i is position i + 1.
        let positions = options.len() + 1;
        let current = slot
            .as_deref()
            .and_then(|name| options.iter().position(|c| c == name))
            .map(|i| i + 1)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % positions
        } else {
            (current + positions - 1) % positions
        };
        let value = if next == 0 {
            None
        } else {
            Some(options[next - 1].clone())
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Apply a key. Returns true when the selections changed.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.focus_next();
                false
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.focus_prev();
                false
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_focused(),
            KeyCode::Right | KeyCode::Char('l') => self.cycle_focused(true),
            KeyCode::Left | KeyCode::Char('h') => self.cycle_focused(false),
            _ => false,
        }
    }

    /// Text shown next to a control's label.
    pub fn value_display(&self, control: EdaFocus) -> String {
        match control {
            EdaFocus::Kind(kind) => checkbox(self.selections.is_enabled(kind)).to_string(),
            EdaFocus::HistGroupToggle => {
                checkbox(self.selections.histogram.group_by_category).to_string()
            }
            other => self
                .slot(other)
                .cloned()
                .flatten()
                .unwrap_or_else(|| "(none)".to_string()),
        }
    }

    fn slot(&self, control: EdaFocus) -> Option<&Option<String>> {
        let s = &self.selections;
        Some(match control {
            EdaFocus::HistColumn => &s.histogram.column,
            EdaFocus::HistGroupColumn => &s.histogram.group_column,
            EdaFocus::BoxColumn => &s.box_plot.column,
            EdaFocus::BoxCategory => &s.box_plot.category,
            EdaFocus::ScatterX => &s.scatter.x,
            EdaFocus::ScatterY => &s.scatter.y,
            EdaFocus::ScatterColor => &s.scatter.color,
            EdaFocus::CountColumn => &s.count_plot.column,
            EdaFocus::Kind(_) | EdaFocus::HistGroupToggle => return None,
        })
    }

    fn slot_mut(&mut self, control: EdaFocus) -> Option<&mut Option<String>> {
        let s = &mut self.selections;
        Some(match control {
            EdaFocus::HistColumn => &mut s.histogram.column,
            EdaFocus::HistGroupColumn => &mut s.histogram.group_column,
            EdaFocus::BoxColumn => &mut s.box_plot.column,
            EdaFocus::BoxCategory => &mut s.box_plot.category,
            EdaFocus::ScatterX => &mut s.scatter.x,
            EdaFocus::ScatterY => &mut s.scatter.y,
            EdaFocus::ScatterColor => &mut s.scatter.color,
            EdaFocus::CountColumn => &mut s.count_plot.column,
            EdaFocus::Kind(_) | EdaFocus::HistGroupToggle => return None,
        })
    }
}

fn checkbox(on: bool) -> &'static str {
    if on {
        "[x]"
    } else {
        "[ ]"
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}
