//! Full-screen views outside the dashboard: login, two-factor entry,
//! and the password recovery pair.

use chrono::Utc;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};
use ratatui::Frame;

use backdesk_engine::App;

use crate::forms::TextField;
use crate::theme::Palette;
use crate::ui::Ui;

/// A centered card of fixed size, clamped to the frame.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn card<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .title(Span::styled(format!(" {title} "), palette.title()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel))
        .padding(Padding::new(2, 2, 1, 1))
}

pub(crate) fn field_line<'a>(
    label: &'a str,
    field: &TextField,
    focused: bool,
    width: usize,
    palette: &Palette,
) -> Line<'a> {
    let marker = if focused { "> " } else { "  " };
    Line::from(vec![
        Span::styled(format!("{marker}{label:<10}"), palette.label()),
        Span::styled(field.display(width), palette.field(focused)),
    ])
}

pub(crate) fn hint_line<'a>(text: &'a str, palette: &Palette) -> Line<'a> {
    Line::from(Span::styled(text, Style::default().fg(palette.text_muted)))
}

pub fn draw_login(frame: &mut Frame, ui: &Ui, palette: &Palette) {
    let area = centered(frame.area(), 52, 11);
    let block = card("Backdesk — Sign in", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        field_line("Email", &ui.login.email, ui.login.focus.is(0), 32, palette),
        Line::default(),
        field_line(
            "Password",
            &ui.login.password,
            ui.login.focus.is(1),
            32,
            palette,
        ),
        Line::default(),
        hint_line("Enter sign in · Tab next field · Ctrl+F forgot password", palette),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn draw_otp(frame: &mut Frame, app: &App, ui: &Ui, palette: &Palette) {
    let area = centered(frame.area(), 56, 12);
    let block = card("Two-factor verification", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(challenge) = app.challenge() {
        lines.push(Line::from(Span::styled(
            format!("A code was sent to {}", challenge.masked_contact()),
            palette.label(),
        )));
        let remaining = challenge.seconds_remaining(Utc::now());
        let (text, style) = if remaining > 0 {
            (
                format!("Expires in {}:{:02}", remaining / 60, remaining % 60),
                Style::default().fg(palette.text_muted),
            )
        } else {
            (
                "Code expired — press Ctrl+R for a new one".to_owned(),
                Style::default().fg(palette.error),
            )
        };
        lines.push(Line::from(Span::styled(text, style)));
        lines.push(Line::default());
    }
    lines.push(field_line("Code", &ui.otp.code, true, 12, palette));
    lines.push(Line::default());
    let resend_wait = app.resend_wait_seconds(Utc::now());
    let hints = if resend_wait > 0 {
        format!("Enter verify · resend in {resend_wait}s · Esc back to sign in")
    } else {
        "Enter verify · Ctrl+R resend · Esc back to sign in".to_owned()
    };
    lines.push(hint_line(&hints, palette));
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn draw_forgot_password(frame: &mut Frame, ui: &Ui, palette: &Palette) {
    let area = centered(frame.area(), 56, 10);
    let block = card("Password recovery", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled(
            "We'll email a reset code to your address.",
            palette.label(),
        )),
        Line::default(),
        field_line("Email", &ui.forgot.email, true, 32, palette),
        Line::default(),
        hint_line("Enter send reset email · Esc back", palette),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn draw_reset_password(frame: &mut Frame, ui: &Ui, palette: &Palette) {
    let area = centered(frame.area(), 56, 13);
    let block = card("Set a new password", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        field_line("Code", &ui.reset.token, ui.reset.focus.is(0), 28, palette),
        Line::default(),
        field_line("Email", &ui.reset.email, ui.reset.focus.is(1), 28, palette),
        Line::default(),
        field_line(
            "Password",
            &ui.reset.password,
            ui.reset.focus.is(2),
            28,
            palette,
        ),
        Line::default(),
        hint_line("8+ chars with upper, lower, and a digit", palette),
        hint_line("Enter save · Tab next field · Esc back", palette),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Bottom status line, shared by every screen.
pub fn draw_status(frame: &mut Frame, app: &App, ui: &Ui, palette: &Palette, area: Rect) {
    use backdesk_engine::StatusKind;

    let glyphs = crate::theme::Glyphs::pick(app.settings.ascii_only);
    let mut spans = Vec::new();
    if app.pending_writes > 0 {
        spans.push(Span::styled(
            format!("{} ", glyphs.spinner_frame(ui.tick)),
            Style::default().fg(palette.accent),
        ));
    }
    if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => palette.text_secondary,
            StatusKind::Success => palette.success,
            StatusKind::Error => palette.error,
        };
        spans.push(Span::styled(&status.text, Style::default().fg(color)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
        area,
    );
}

/// Split the frame into content + one status row.
pub fn layout(frame: &Frame) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());
    (chunks[0], chunks[1])
}
