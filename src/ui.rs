use crate::app::App;
use crate::braille;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 26;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 30;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Status
            Constraint::Length(8), // Trials
            Constraint::Min(6),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_trials_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Percolation ");

    let n = app.grid.size();
    let fraction = app.open_fraction();
    let bar_width = (area.width.saturating_sub(4)) as usize;
    let filled = ((fraction * bar_width as f64) as usize).min(bar_width);
    let empty = bar_width - filled;

    let (status_text, status_color) = if app.paused {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else if app.percolated() {
        ("PERCOLATES", Color::Green)
    } else {
        ("RUNNING", BORDER_COLOR)
    };

    let content = vec![
        Line::from(Span::styled(format!("{n} x {n} grid"), Style::default().fg(TEXT_COLOR))),
        Line::from(Span::styled(
            format!("open {} ({:.4})", app.grid.number_of_open_sites(), fraction),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(vec![
            Span::styled("█".repeat(filled), Style::default().fg(braille::FULL_COLOR)),
            Span::styled("░".repeat(empty), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
    ];

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_trials_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Trials ");
    let summary = &app.completed;
    let value_style = Style::default().fg(TEXT_COLOR);
    let dim = Style::default().fg(DIM_TEXT_COLOR);

    let last = app
        .last_threshold
        .map(|t| format!("{:.4}", t))
        .unwrap_or_else(|| "-".to_string());

    let interval = app
        .confidence_interval()
        .map(|(lo, hi)| format!("{:.4}, {:.4}", lo, hi))
        .unwrap_or_else(|| "-".to_string());

    let content = vec![
        Line::from(Span::styled(
            format!("done   {} / {}", summary.count(), app.settings.trials),
            value_style,
        )),
        Line::from(Span::styled(format!("last   {}", last), value_style)),
        Line::from(Span::styled(format!("mean   {:.4}", summary.mean()), value_style)),
        Line::from(Span::styled(format!("stddev {:.4}", summary.stddev()), value_style)),
        Line::from(Span::styled(
            format!("{} [{}]", app.settings.confidence.name(), interval),
            value_style,
        )),
        Line::from(Span::styled(
            format!("auto   {}", if app.auto_advance { "on" } else { "off" }),
            dim,
        )),
    ];

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: String| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume".to_string()),
        make_control("N", "next trial".to_string()),
        make_control("A", "auto-advance".to_string()),
        make_control("R", "reset all".to_string()),
        make_control("+/-", format!("speed: {}", app.steps_per_frame)),
        make_control("[/]", format!("grid: {}", app.settings.grid_size)),
        make_control("</>", format!("trials: {}", app.settings.trials)),
        make_control("C", format!("level: {}", app.settings.confidence.name())),
        make_control("V", "fullscreen".to_string()),
        make_control("H", "help".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    frame.render_widget(Paragraph::new(content).block(styled_block(" Controls ")), area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(&app.sites, app.grid.size(), inner.width, inner.height);

    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            let cell_rect = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            let span = Span::styled(cell.char.to_string(), Style::default().fg(cell.color));
            frame.render_widget(Paragraph::new(Line::from(span)), cell_rect);
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(24);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("SITE PERCOLATION", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from(concat!(
            "Blocked sites are opened uniformly at random until an open path joins ",
            "the top row to the bottom row. The fraction of open sites at that moment ",
            "is one estimate of the percolation threshold (about 0.5927 for large grids)."
        )),
        Line::from(""),
        Line::from(Span::styled("COLORS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from(Span::styled("White - open", Style::default().fg(braille::OPEN_COLOR))),
        Line::from(Span::styled(
            "Blue - full (reachable from the top)",
            Style::default().fg(braille::FULL_COLOR),
        )),
        Line::from(""),
        Line::from(Span::styled("CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from(concat!(
            "Space=Pause, N=Next trial, A=Auto-advance, R=Reset, +/-=Speed, ",
            "[/]=Grid size, </>=Trials, C=Confidence level, V=Fullscreen, Q=Quit"
        )),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let is_scrollable = content_height > visible_height;

    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
