use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEYBINDS: &[(&str, &[(&str, &str)])] = &[
    (
        "Everywhere:",
        &[
            ("q / Ctrl-C", "Quit"),
            ("→ / n", "Next step (submits on the documents step)"),
            ("← / b", "Previous step"),
            ("1-4", "Jump to a step indicator"),
            ("?", "Show this help"),
        ],
    ),
    (
        "Segment and KPI steps:",
        &[("↑/↓ or j/k", "Move"), ("enter / space", "Select or toggle")],
    ),
    (
        "Documents step:",
        &[
            ("tab", "Switch between drop targets and comments"),
            ("enter", "Type file paths for the focused target"),
            ("paste", "Drop pasted file paths onto the focused target"),
            ("esc", "Leave the comment box"),
        ],
    ),
    (
        "Analysis step:",
        &[
            ("↑/↓", "Scroll"),
            ("h / l", "Move the chart crosshair"),
            ("t", "Save text report"),
            ("d", "Save DOCX report"),
            ("y", "Copy saved path to clipboard"),
        ],
    ),
];

pub fn help_lines() -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, (heading, binds)) in KEYBINDS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(*heading));
        for (key, what) in binds.iter() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{key:<14}"), Style::default().fg(Color::Magenta)),
                Span::raw(*what),
            ]));
        }
    }
    lines
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(help_lines())
        .block(Block::default().borders(Borders::ALL).title("Help (any key closes)"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
