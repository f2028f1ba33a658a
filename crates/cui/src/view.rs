use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Span, Style, Stylize};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(11),
            Constraint::Length(8),
        ])
        .split(frame.area());

    draw_header(frame, root[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(root[1]);

    draw_reel(frame, middle[0], app);
    draw_history(frame, middle[1], app);
    draw_events(frame, root[2], app);

    if app.show_help {
        draw_help_popup(frame);
    }
    if app.upload_prompt.is_some() {
        draw_upload_prompt(frame, app);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let counts = app.picker.renderer().counts;
    let lines = vec![
        Line::from(vec![
            "Random Picker".bold(),
            Span::raw(format!(
                "  remaining {}  drawn {}",
                counts.remaining, counts.drawn
            )),
        ]),
        Line::from(format!("status: {}", app.status_line)),
    ];
    let block = Block::default().borders(Borders::ALL).title("Overview");
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}

fn draw_reel(frame: &mut Frame, area: Rect, app: &App) {
    let visual = app.visual();
    let labels = app.slot_labels();
    let centre = labels.len() / 2;
    let border = if visual.spinning {
        Style::default().fg(Color::Yellow)
    } else if visual.bounce {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if visual.selected {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title("Draw [space]");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let constraints: Vec<Constraint> = labels
        .iter()
        .map(|_| Constraint::Ratio(1, labels.len().max(1) as u32))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);
    for (idx, label) in labels.iter().enumerate() {
        let style = if idx == centre {
            let style = Style::default().add_modifier(Modifier::BOLD);
            if visual.selected {
                style.fg(Color::Green)
            } else {
                style
            }
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let paragraph = Paragraph::new(Line::from(label.clone()).style(style))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, rows[idx]);
    }
}

fn draw_history(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .visible_history()
        .into_iter()
        .map(ListItem::new)
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(app.history_title()),
    );
    frame.render_widget(list, area);
}

fn draw_events(frame: &mut Frame, area: Rect, app: &App) {
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .event_log
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|line| ListItem::new(line.clone()))
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Events"));
    frame.render_widget(list, area);
}

fn draw_help_popup(frame: &mut Frame) {
    let area = centered_rect(50, 40, frame.area());
    let lines = vec![
        Line::from("space / enter / d  draw"),
        Line::from("r                  reset drawn items"),
        Line::from("u                  load a list from a file"),
        Line::from("h                  show or hide history"),
        Line::from("?                  toggle help"),
        Line::from("q                  quit"),
    ];
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_upload_prompt(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, frame.area());
    let input = app.upload_prompt.as_deref().unwrap_or_default();
    let lines = vec![
        Line::from("One item per line; anything after a comma is ignored."),
        Line::from(format!("> {input}")),
    ];
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Upload list"))
        .wrap(Wrap { trim: false });
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
