use super::App;
use crate::tree::EMPTY_STATE;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Tree
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_tree(f, app, chunks[0]);
    draw_status_bar(f, app, chunks[1]);

    if app.model.is_sort_popup_open() {
        draw_sort_menu(f, app);
    }
}

fn draw_tree(f: &mut Frame, app: &App, area: Rect) {
    let model = &app.model;
    if model.total_count() == 0 {
        let paragraph = Paragraph::new(EMPTY_STATE).style(Style::default().fg(Color::DarkGray));
        f.render_widget(paragraph, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        model.render_header(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));

    for sticky in model.sticky_scroll_lines() {
        lines.push(Line::from(Span::styled(
            sticky,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    for row in model.visible_rows() {
        let mut style = Style::default();
        if row.dimmed {
            style = style.fg(Color::DarkGray);
        } else if row.search_match {
            style = style.fg(Color::Yellow);
        } else if row.marked {
            style = style.fg(Color::Magenta);
        }
        if row.selected {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(row.text, style)));
    }

    if let Some(indicator) = model.position_indicator() {
        lines.push(Line::from(Span::styled(indicator, Style::default().fg(Color::DarkGray))));
    }
    if let Some(bar) = model.search_bar() {
        lines.push(Line::from(Span::styled(bar, Style::default().fg(Color::Yellow))));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let model = &app.model;
    let sort_indicator = format!(
        "[Sort: {} {}] [Filter: {}]",
        model.sort_field().label(),
        model.sort_direction().indicator(),
        model.filter()
    );

    let status = if let Some(prompt) = &app.prompt {
        Span::styled(
            format!(" {}: {}▏ | Enter: apply | Esc: cancel ", prompt.kind.label(), prompt.input),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else if let Some(err) = &app.error_message {
        Span::styled(err.as_str(), Style::default().fg(Color::Red))
    } else if let Some(msg) = &app.status_message {
        Span::styled(msg.as_str(), Style::default().fg(Color::Green))
    } else if model.is_search_mode() {
        Span::styled(
            " Type to search | Enter: keep matches | Esc: cancel ",
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::styled(
            format!(
                " j/k: nav | h/l: fold | Enter: cycle | /: search | f: filter | s/S: sort {} | q: quit ",
                sort_indicator
            ),
            Style::default().fg(Color::DarkGray),
        )
    };

    f.render_widget(Paragraph::new(Line::from(status)), area);
}

fn draw_sort_menu(f: &mut Frame, app: &App) {
    let area = centered_rect(40, 50, f.area());
    f.render_widget(Clear, area);

    let text = format!("{}\n\n  j/k: move | Enter: apply | Esc: cancel", app.model.render_sort_popup());
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(" Sort ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
