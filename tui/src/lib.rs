//! Terminal front end: rendering and keyboard handling.
//!
//! The engine's [`App`](backdesk_engine::App) owns everything worth
//! persisting or fetching; this crate owns only presentation state
//! ([`Ui`]) and translates key events into `App` action calls.

pub mod dashboard;
pub mod forms;
pub mod input;
pub mod modals;
pub mod screens;
pub mod theme;
pub mod ui;

use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::Frame;

use backdesk_engine::{App, Screen};

pub use input::handle_key;
pub use theme::{Glyphs, Palette};
pub use ui::{Modal, Ui};

/// Render one frame.
pub fn draw(frame: &mut Frame, app: &App, ui: &mut Ui) {
    ui.tick = ui.tick.wrapping_add(1);
    let palette = Palette::pick(app.settings.high_contrast);

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg_dark)),
        frame.area(),
    );

    let (content, status) = screens::layout(frame);
    match app.screen {
        Screen::Login => screens::draw_login(frame, ui, &palette),
        Screen::Otp => screens::draw_otp(frame, app, ui, &palette),
        Screen::ForgotPassword => screens::draw_forgot_password(frame, ui, &palette),
        Screen::ResetPassword => screens::draw_reset_password(frame, ui, &palette),
        Screen::Dashboard(_) => dashboard::draw_dashboard(frame, app, ui, &palette, content),
    }
    modals::draw_modal(frame, app, ui, &palette);
    screens::draw_status(frame, app, ui, &palette, status);
}
