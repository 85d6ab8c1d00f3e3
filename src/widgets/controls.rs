use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget},
};

/// Bottom bar of key hints with an optional status message on the right.
pub struct Controls {
    pub controls: Vec<(&'static str, &'static str)>,
    pub status: Option<String>,
    pub bg_color: Color,
    pub key_color: Color,   // Color for keybind hints (keys in toolbar)
    pub label_color: Color, // Color for action labels
    pub status_color: Color,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            controls: Vec::new(),
            status: None,
            bg_color: Color::Indexed(236),
            key_color: Color::Cyan,
            label_color: Color::White,
            status_color: Color::White,
        }
    }
}

impl Controls {
    pub fn new(controls: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            controls,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn with_colors(mut self, bg_color: Color, key_color: Color, label_color: Color) -> Self {
        self.bg_color = bg_color;
        self.key_color = key_color;
        self.label_color = label_color;
        self
    }

    pub fn with_status_color(mut self, color: Color) -> Self {
        self.status_color = color;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let no_bg = self.bg_color == Color::Reset;
        if !no_bg {
            Block::default()
                .style(Style::default().bg(self.bg_color))
                .render(area, buf);
        }

        // Width of one key-label pair (fixed; pairs are never shrunk).
        let pair_width = |(key, action): &(&str, &str)| -> u16 {
            (key.chars().count() as u16 + 1) + (action.chars().count() as u16 + 1)
        };

        let status_width = self
            .status
            .as_ref()
            .map(|s| s.chars().count() as u16 + 1)
            .unwrap_or(0)
            .min(area.width / 2);
        let mut available = area.width.saturating_sub(status_width);

        let mut n_show = 0;
        for pair in self.controls.iter() {
            let need = pair_width(pair);
            if available >= need {
                available -= need;
                n_show += 1;
            } else {
                break;
            }
        }

        let mut constraints: Vec<Constraint> = self
            .controls
            .iter()
            .take(n_show)
            .flat_map(|(key, action)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 1),
                    Constraint::Length(action.chars().count() as u16 + 1),
                ]
            })
            .collect();
        constraints.push(Constraint::Fill(1));
        constraints.push(Constraint::Length(status_width));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let base = if no_bg {
            Style::default()
        } else {
            Style::default().bg(self.bg_color)
        };
        let key_style = base.fg(self.key_color);
        let label_style = base.fg(self.label_color);

        for (i, (key, action)) in self.controls.iter().take(n_show).enumerate() {
            let j = i * 2;
            Paragraph::new(*key).style(key_style).render(layout[j], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[j + 1], buf);
        }

        let fill_idx = n_show * 2;
        Paragraph::new("").style(base).render(layout[fill_idx], buf);
        if let Some(status) = &self.status {
            Paragraph::new(status.as_str())
                .style(base.fg(self.status_color))
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_pairs_that_fit_and_status() {
        let controls = Controls::new(vec![("q", "Quit"), ("?", "Help"), ("e", "Export")])
            .with_status(Some("Saved".to_string()));
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        (&controls).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("q Quit"));
        assert!(text.contains("e Export"));
        assert!(text.trim_end().ends_with("Saved"));
    }

    #[test]
    fn drops_pairs_that_do_not_fit() {
        let controls = Controls::new(vec![("q", "Quit"), ("e", "Export")]);
        let area = Rect::new(0, 0, 8, 1);
        let mut buf = Buffer::empty(area);
        (&controls).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("q Quit"));
        assert!(!text.contains("Export"));
    }
}
