//! Popup dialogs layered over the dashboard.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};
use ratatui::Frame;

use backdesk_engine::{App, Freshness, ResolutionState};
use backdesk_types::{permission_description, rank_banks, Role};

use crate::screens::{field_line, hint_line};
use crate::theme::{Glyphs, Palette};
use crate::ui::{
    AccountForm, Modal, PayoutForm, RejectForm, StatementForm, Ui, UserForm,
};

fn popup(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn popup_card<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .title(Span::styled(format!(" {title} "), palette.title()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_popup))
        .padding(Padding::new(2, 2, 1, 1))
}

pub fn draw_modal(frame: &mut Frame, app: &App, ui: &Ui, palette: &Palette) {
    let Some(modal) = &ui.modal else {
        return;
    };
    match modal {
        Modal::PayoutDetail(id) => draw_payout_detail(frame, app, id, palette),
        Modal::TransactionDetail(id) => draw_transaction_detail(frame, app, id, palette),
        Modal::AccountDetail(id) => draw_account_detail(frame, app, id, palette),
        Modal::CreatePayout(form) => draw_create_payout(frame, app, form, palette),
        Modal::RejectPayout(form) => draw_reject_payout(frame, form, palette),
        Modal::CreateAccount(form) => draw_create_account(frame, form, palette),
        Modal::CreateUser(form) => draw_create_user(frame, app, form, palette),
        Modal::Statement(form) => draw_statement(frame, form, palette),
    }
}

fn detail_row<'a>(label: &'a str, value: String, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<14}"), palette.label()),
        Span::styled(value, Style::default().fg(palette.text_primary)),
    ])
}

fn draw_payout_detail(
    frame: &mut Frame,
    app: &App,
    id: &backdesk_types::PayoutId,
    palette: &Palette,
) {
    let area = popup(frame.area(), 58, 15);
    frame.render_widget(Clear, area);
    let block = popup_card("Payout", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(payout) = app.caches.payout_details.get(id) {
        lines.push(detail_row(
            "Beneficiary",
            payout.beneficiary_account_name.clone(),
            palette,
        ));
        lines.push(detail_row(
            "Account",
            format!(
                "{} · {}",
                payout.beneficiary_account_number,
                payout.bank_name.clone().unwrap_or_else(|| {
                    payout.beneficiary_bank_code.clone()
                })
            ),
            palette,
        ));
        lines.push(detail_row(
            "Amount",
            payout.amount.formatted_with(&payout.currency),
            palette,
        ));
        lines.push(detail_row("Status", payout.status.label().to_owned(), palette));
        lines.push(detail_row(
            "Approval",
            payout.approval_status.label().to_owned(),
            palette,
        ));
        if let Some(narration) = &payout.narration {
            lines.push(detail_row("Narration", narration.clone(), palette));
        }
        lines.push(detail_row(
            "Created",
            payout.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            palette,
        ));
        if app.caches.payout_details.freshness(id) == Freshness::Stale {
            lines.push(Line::default());
            lines.push(hint_line("refreshing…", palette));
        }
    } else {
        lines.push(hint_line("loading…", palette));
    }
    lines.push(Line::default());
    lines.push(hint_line("Esc close", palette));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_transaction_detail(
    frame: &mut Frame,
    app: &App,
    id: &backdesk_types::TransactionId,
    palette: &Palette,
) {
    let area = popup(frame.area(), 58, 14);
    frame.render_widget(Clear, area);
    let block = popup_card("Transaction", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(tx) = app.caches.transaction_details.get(id) {
        lines.push(detail_row("Type", tx.transaction_type.label().to_owned(), palette));
        lines.push(detail_row(
            "Amount",
            tx.amount.formatted_with(&tx.currency),
            palette,
        ));
        if let Some(reference) = &tx.reference {
            lines.push(detail_row("Reference", reference.clone(), palette));
        }
        if let Some(counterparty) = &tx.counterparty {
            lines.push(detail_row("Counterparty", counterparty.clone(), palette));
        }
        if let Some(narration) = &tx.narration {
            lines.push(detail_row("Narration", narration.clone(), palette));
        }
        lines.push(detail_row("Status", tx.status.clone(), palette));
        lines.push(detail_row(
            "Created",
            tx.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            palette,
        ));
        if app.caches.transaction_details.freshness(id) == Freshness::Stale {
            lines.push(Line::default());
            lines.push(hint_line("refreshing…", palette));
        }
    } else {
        lines.push(hint_line("loading…", palette));
    }
    lines.push(Line::default());
    lines.push(hint_line("Esc close", palette));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_account_detail(
    frame: &mut Frame,
    app: &App,
    id: &backdesk_types::AccountId,
    palette: &Palette,
) {
    let area = popup(frame.area(), 58, 13);
    frame.render_widget(Clear, area);
    let block = popup_card("Virtual account", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(account) = app.caches.account_details.get(id) {
        lines.push(detail_row("Name", account.account_name.clone(), palette));
        lines.push(detail_row(
            "Number",
            account.account_number.clone(),
            palette,
        ));
        if let Some(bank) = &account.bank_name {
            lines.push(detail_row("Bank", bank.clone(), palette));
        }
        if let Some(balance) = &account.balance {
            lines.push(detail_row(
                "Balance",
                balance.formatted_with(&account.currency),
                palette,
            ));
        }
        if let Some(status) = &account.status {
            lines.push(detail_row("Status", status.clone(), palette));
        }
        lines.push(detail_row(
            "Created",
            account.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            palette,
        ));
        if app.caches.account_details.freshness(id) == Freshness::Stale {
            lines.push(Line::default());
            lines.push(hint_line("refreshing…", palette));
        }
    } else {
        lines.push(hint_line("loading…", palette));
    }
    lines.push(Line::default());
    lines.push(hint_line("Esc close", palette));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_create_payout(frame: &mut Frame, app: &App, form: &PayoutForm, palette: &Palette) {
    let area = popup(frame.area(), 62, 20);
    frame.render_widget(Clear, area);
    let block = popup_card("New payout", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        field_line("Amount", &form.amount, form.focus.is(0), 20, palette),
        field_line(
            "Account #",
            &form.account_number,
            form.focus.is(1),
            20,
            palette,
        ),
        field_line("Bank", &form.bank_query, form.focus.is(2), 28, palette),
    ];

    // Ranked dropdown under the bank query while it has focus.
    if form.focus.is(2) {
        let banks = app.caches.banks.get(&());
        match banks {
            Some(banks) => {
                let ranked = rank_banks(banks, form.bank_query.value());
                if ranked.is_empty() {
                    lines.push(hint_line("  no matching banks", palette));
                }
                for (i, bank) in ranked.iter().enumerate().take(5) {
                    let style = if i == form.bank_cursor {
                        palette.selected_row()
                    } else {
                        Style::default().fg(palette.text_secondary)
                    };
                    lines.push(Line::from(Span::styled(
                        format!("  {} ({})", bank.bank_name, bank.bank_code),
                        style,
                    )));
                }
            }
            None => lines.push(hint_line("  loading banks…", palette)),
        }
    } else if let Some(bank) = &form.selected_bank {
        lines.push(Line::from(Span::styled(
            format!("  {} ({})", bank.bank_name, bank.bank_code),
            Style::default().fg(palette.accent),
        )));
    }

    // Live account-name resolution feedback.
    let resolution = match app.resolver.state() {
        ResolutionState::Idle => None,
        ResolutionState::Waiting | ResolutionState::Resolving => Some((
            "resolving account…".to_owned(),
            Style::default().fg(palette.text_muted),
        )),
        ResolutionState::Resolved(resolved) => Some((
            resolved.account_name.clone(),
            Style::default().fg(palette.success),
        )),
        ResolutionState::Failed(message) => {
            Some((message.clone(), Style::default().fg(palette.error)))
        }
    };
    if let Some((text, style)) = resolution {
        lines.push(Line::from(vec![
            Span::styled("  Name      ", palette.label()),
            Span::styled(text, style),
        ]));
    }

    lines.push(field_line(
        "Narration",
        &form.narration,
        form.focus.is(3),
        28,
        palette,
    ));
    lines.push(Line::default());
    lines.push(hint_line("Enter submit · Tab next field · Esc cancel", palette));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_reject_payout(frame: &mut Frame, form: &RejectForm, palette: &Palette) {
    let area = popup(frame.area(), 58, 10);
    frame.render_widget(Clear, area);
    let block = popup_card("Reject payout", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        field_line("Reason", &form.reason, true, 36, palette),
        Line::default(),
        hint_line("At least 10 characters.", palette),
        Line::default(),
        hint_line("Enter reject · Esc cancel", palette),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_create_account(frame: &mut Frame, form: &AccountForm, palette: &Palette) {
    let area = popup(frame.area(), 58, 12);
    frame.render_widget(Clear, area);
    let block = popup_card("New virtual account", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        field_line("Name", &form.name, form.focus.is(0), 28, palette),
        field_line("Currency", &form.currency, form.focus.is(1), 8, palette),
        field_line("Reference", &form.reference, form.focus.is(2), 28, palette),
        Line::default(),
        hint_line("Enter create · Tab next field · Esc cancel", palette),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_create_user(frame: &mut Frame, app: &App, form: &UserForm, palette: &Palette) {
    let area = popup(frame.area(), 62, 20);
    frame.render_widget(Clear, area);
    let block = popup_card("New user", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let glyphs = Glyphs::pick(app.settings.ascii_only);
    let mut lines = vec![
        field_line("First name", &form.first_name, form.focus.is(0), 24, palette),
        field_line("Last name", &form.last_name, form.focus.is(1), 24, palette),
        field_line("Email", &form.email, form.focus.is(2), 28, palette),
        field_line("Password", &form.password, form.focus.is(3), 24, palette),
        Line::from(Span::styled("  Roles", palette.label())),
    ];

    match app.caches.roles.get(&()) {
        Some(roles) if !roles.is_empty() => {
            for (i, role) in roles.iter().enumerate() {
                let key = role.key.clone().unwrap_or_default();
                let selected = form.selected_roles.iter().any(|r| *r == key);
                let mark = if selected { glyphs.check } else { " " };
                let cursor = if form.focus.is(4) && i == form.role_cursor {
                    "> "
                } else {
                    "  "
                };
                let style = if selected {
                    Style::default().fg(palette.success)
                } else {
                    Style::default().fg(palette.text_secondary)
                };
                lines.push(Line::from(Span::styled(
                    format!("  {cursor}[{mark}] {}", Role::display_name(role)),
                    style,
                )));
            }
        }
        _ => lines.push(hint_line("  loading roles…", palette)),
    }

    // Permissions granted by the role under the cursor.
    if form.focus.is(4) {
        let permissions = app
            .caches
            .roles
            .get(&())
            .and_then(|roles| roles.get(form.role_cursor))
            .map(|role| role.permissions.clone())
            .unwrap_or_default();
        for permission in permissions.iter().take(3) {
            lines.push(Line::from(Span::styled(
                format!("    {} {}", glyphs.bullet, permission_description(permission)),
                Style::default().fg(palette.text_muted),
            )));
        }
    }

    lines.push(Line::default());
    lines.push(hint_line(
        "Enter create · Space toggle role · Tab next field · Esc cancel",
        palette,
    ));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_statement(frame: &mut Frame, form: &StatementForm, palette: &Palette) {
    let area = popup(frame.area(), 58, 15);
    frame.render_widget(Clear, area);
    let block = popup_card("Request statement", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let type_label = form
        .transaction_type
        .map_or("All", backdesk_types::TransactionType::label);
    let lines = vec![
        field_line("Start", &form.start_date, form.focus.is(0), 12, palette),
        field_line("End", &form.end_date, form.focus.is(1), 12, palette),
        field_line("Email", &form.email, form.focus.is(2), 28, palette),
        Line::from(vec![
            Span::styled(
                if form.focus.is(3) { "> Type      " } else { "  Type      " },
                palette.label(),
            ),
            Span::styled(type_label, palette.field(form.focus.is(3))),
        ]),
        Line::from(vec![
            Span::styled(
                if form.focus.is(4) { "> Format    " } else { "  Format    " },
                palette.label(),
            ),
            Span::styled(
                form.export.as_query_value().to_uppercase(),
                palette.field(form.focus.is(4)),
            ),
        ]),
        Line::default(),
        hint_line("Dates are YYYY-MM-DD; the statement arrives by email.", palette),
        hint_line("Enter request · Space cycle type/format · Esc cancel", palette),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
