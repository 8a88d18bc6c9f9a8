//! The tabbed dashboard: one table per resource.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs};
use ratatui::Frame;

use backdesk_engine::{App, Freshness, Tab};
use backdesk_types::Page;

use crate::theme::Palette;
use crate::ui::Ui;

pub fn draw_dashboard(frame: &mut Frame, app: &App, ui: &mut Ui, palette: &Palette, area: Rect) {
    let Some(tab) = current_tab(app) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Tabs + account header
            Constraint::Min(1),    // Table
            Constraint::Length(1), // Hints
        ])
        .split(area);

    draw_tabs(frame, app, tab, palette, chunks[0]);
    match tab {
        Tab::Payouts => draw_payouts(frame, app, ui, palette, chunks[1]),
        Tab::Transactions => draw_transactions(frame, app, ui, palette, chunks[1]),
        Tab::Accounts => draw_accounts(frame, app, ui, palette, chunks[1]),
        Tab::Users => draw_users(frame, app, ui, palette, chunks[1]),
        Tab::AuditLogs => draw_audit(frame, app, ui, palette, chunks[1]),
    }
    draw_hints(frame, tab, palette, chunks[2]);
}

fn current_tab(app: &App) -> Option<Tab> {
    match app.screen {
        backdesk_engine::Screen::Dashboard(tab) => Some(tab),
        _ => None,
    }
}

fn draw_tabs(frame: &mut Frame, app: &App, tab: Tab, palette: &Palette, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|t| Line::from(t.title()))
        .collect();
    let selected = Tab::ALL.iter().position(|t| *t == tab).unwrap_or(0);

    let who = app
        .session
        .profile()
        .map(|p| p.display_name())
        .unwrap_or_default();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(who.len() as u16 + 2)])
        .split(area);

    frame.render_widget(
        Tabs::new(titles)
            .select(selected)
            .style(palette.label())
            .highlight_style(palette.title()),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(who, Style::default().fg(palette.text_muted))),
        chunks[1],
    );
}

/// Table header + footer describing freshness and pagination.
fn page_footer<T>(page: Option<&Page<T>>, freshness: Freshness) -> String {
    let Some(page) = page else {
        return "loading…".to_owned();
    };
    let total = page
        .total_pages
        .map_or(String::new(), |t| format!(" of {t}"));
    let stale = match freshness {
        Freshness::Fresh => "",
        Freshness::Stale => " · refreshing",
        Freshness::Missing => " · loading",
    };
    format!("page {}{total}{stale}", page.page)
}

fn styled_table<'a>(
    title: String,
    header: Row<'a>,
    rows: Vec<Row<'a>>,
    widths: &'a [Constraint],
    palette: &Palette,
) -> Table<'a> {
    Table::new(rows, widths)
        .header(header.style(palette.label()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.bg_border))
                .title(Span::styled(title, palette.label())),
        )
        .row_highlight_style(palette.selected_row())
}

fn clamp_selection(selection: &mut usize, len: usize) {
    if len == 0 {
        *selection = 0;
    } else if *selection >= len {
        *selection = len - 1;
    }
}

fn draw_payouts(frame: &mut Frame, app: &App, ui: &mut Ui, palette: &Palette, area: Rect) {
    let cursor = app.cursors.payouts;
    let page = app.caches.payout_pages.get(&cursor);
    let freshness = app.caches.payout_pages.freshness(&cursor);

    let rows: Vec<Row> = page.map_or_else(Vec::new, |p| {
        p.items
            .iter()
            .map(|payout| {
                let approval_style = match payout.approval_status {
                    backdesk_types::ApprovalStatus::Pending => Style::default().fg(palette.warning),
                    backdesk_types::ApprovalStatus::Approved => {
                        Style::default().fg(palette.success)
                    }
                    backdesk_types::ApprovalStatus::Rejected => Style::default().fg(palette.error),
                };
                Row::new(vec![
                    Cell::from(payout.beneficiary_account_name.clone()),
                    Cell::from(payout.bank_name.clone().unwrap_or_default()),
                    Cell::from(payout.amount.formatted_with(&payout.currency)),
                    Cell::from(payout.status.label()),
                    Cell::from(Span::styled(payout.approval_status.label(), approval_style)),
                    Cell::from(payout.created_at.format("%Y-%m-%d %H:%M").to_string()),
                ])
            })
            .collect()
    });

    clamp_selection(&mut ui.selection.payouts, rows.len());
    let mut state = ratatui::widgets::TableState::default();
    state.select((!rows.is_empty()).then_some(ui.selection.payouts));

    let header = Row::new(vec![
        "Beneficiary",
        "Bank",
        "Amount",
        "Status",
        "Approval",
        "Created",
    ]);
    let widths = [
        Constraint::Min(18),
        Constraint::Min(14),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(16),
    ];
    let table = styled_table(
        format!(" Payouts — {} ", page_footer(page, freshness)),
        header,
        rows,
        &widths,
        palette,
    );
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_transactions(frame: &mut Frame, app: &App, ui: &mut Ui, palette: &Palette, area: Rect) {
    let cursor = app.cursors.transactions;
    let page = app.caches.transaction_pages.get(&cursor);
    let freshness = app.caches.transaction_pages.freshness(&cursor);

    let rows: Vec<Row> = page.map_or_else(Vec::new, |p| {
        p.items
            .iter()
            .map(|tx| {
                let amount_style = match tx.transaction_type {
                    backdesk_types::TransactionType::Credit => Style::default().fg(palette.success),
                    backdesk_types::TransactionType::Debit => Style::default().fg(palette.error),
                };
                Row::new(vec![
                    Cell::from(tx.reference.clone().unwrap_or_default()),
                    Cell::from(tx.transaction_type.label()),
                    Cell::from(Span::styled(
                        tx.amount.formatted_with(&tx.currency),
                        amount_style,
                    )),
                    Cell::from(tx.narration.clone().unwrap_or_default()),
                    Cell::from(tx.status.clone()),
                    Cell::from(tx.created_at.format("%Y-%m-%d %H:%M").to_string()),
                ])
            })
            .collect()
    });

    clamp_selection(&mut ui.selection.transactions, rows.len());
    let mut state = ratatui::widgets::TableState::default();
    state.select((!rows.is_empty()).then_some(ui.selection.transactions));

    let header = Row::new(vec![
        "Reference",
        "Type",
        "Amount",
        "Narration",
        "Status",
        "Created",
    ]);
    let widths = [
        Constraint::Min(14),
        Constraint::Length(7),
        Constraint::Length(16),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(16),
    ];
    let table = styled_table(
        format!(" Transactions — {} ", page_footer(page, freshness)),
        header,
        rows,
        &widths,
        palette,
    );
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_accounts(frame: &mut Frame, app: &App, ui: &mut Ui, palette: &Palette, area: Rect) {
    let cursor = app.cursors.accounts;
    let page = app.caches.account_pages.get(&cursor);
    let freshness = app.caches.account_pages.freshness(&cursor);

    let rows: Vec<Row> = page.map_or_else(Vec::new, |p| {
        p.items
            .iter()
            .map(|account| {
                Row::new(vec![
                    Cell::from(account.account_name.clone()),
                    Cell::from(account.account_number.clone()),
                    Cell::from(account.bank_name.clone().unwrap_or_default()),
                    Cell::from(
                        account
                            .balance
                            .map_or(String::from("—"), |b| b.formatted_with(&account.currency)),
                    ),
                    Cell::from(account.status.clone().unwrap_or_default()),
                ])
            })
            .collect()
    });

    clamp_selection(&mut ui.selection.accounts, rows.len());
    let mut state = ratatui::widgets::TableState::default();
    state.select((!rows.is_empty()).then_some(ui.selection.accounts));

    let header = Row::new(vec!["Name", "Number", "Bank", "Balance", "Status"]);
    let widths = [
        Constraint::Min(18),
        Constraint::Length(12),
        Constraint::Min(14),
        Constraint::Length(16),
        Constraint::Length(10),
    ];
    let table = styled_table(
        format!(" Virtual Accounts — {} ", page_footer(page, freshness)),
        header,
        rows,
        &widths,
        palette,
    );
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_users(frame: &mut Frame, app: &App, ui: &mut Ui, palette: &Palette, area: Rect) {
    let cursor = app.cursors.users;
    let page = app.caches.user_pages.get(&cursor);
    let freshness = app.caches.user_pages.freshness(&cursor);

    let rows: Vec<Row> = page.map_or_else(Vec::new, |p| {
        p.items
            .iter()
            .map(|user| {
                let status_style = match user.status {
                    backdesk_types::UserStatus::Active => Style::default().fg(palette.success),
                    backdesk_types::UserStatus::Inactive => {
                        Style::default().fg(palette.text_muted)
                    }
                };
                let roles = user
                    .roles
                    .iter()
                    .map(backdesk_types::Role::display_name)
                    .collect::<Vec<_>>()
                    .join(", ");
                Row::new(vec![
                    Cell::from(user.full_name()),
                    Cell::from(user.email.clone()),
                    Cell::from(roles),
                    Cell::from(Span::styled(user.status.label(), status_style)),
                ])
            })
            .collect()
    });

    clamp_selection(&mut ui.selection.users, rows.len());
    let mut state = ratatui::widgets::TableState::default();
    state.select((!rows.is_empty()).then_some(ui.selection.users));

    let header = Row::new(vec!["Name", "Email", "Roles", "Status"]);
    let widths = [
        Constraint::Min(16),
        Constraint::Min(20),
        Constraint::Min(16),
        Constraint::Length(8),
    ];
    let table = styled_table(
        format!(" Users — {} ", page_footer(page, freshness)),
        header,
        rows,
        &widths,
        palette,
    );
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_audit(frame: &mut Frame, app: &App, ui: &mut Ui, palette: &Palette, area: Rect) {
    let logs = app.caches.audit_logs.get(&());
    let freshness = app.caches.audit_logs.freshness(&());

    let rows: Vec<Row> = logs.map_or_else(Vec::new, |entries| {
        entries
            .iter()
            .map(|entry| {
                let ok = entry.is_successful.unwrap_or(true);
                let result_style = if ok {
                    Style::default().fg(palette.success)
                } else {
                    Style::default().fg(palette.error)
                };
                Row::new(vec![
                    Cell::from(entry.user_email.clone().unwrap_or_default()),
                    Cell::from(entry.action.clone()),
                    Cell::from(Span::styled(
                        entry.result.clone().unwrap_or_else(|| {
                            if ok { "success" } else { "failed" }.to_owned()
                        }),
                        result_style,
                    )),
                    Cell::from(entry.masked_ip()),
                    Cell::from(entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
                ])
            })
            .collect()
    });

    clamp_selection(&mut ui.selection.audit, rows.len());
    let mut state = ratatui::widgets::TableState::default();
    state.select((!rows.is_empty()).then_some(ui.selection.audit));

    let stale = match freshness {
        Freshness::Fresh => "",
        Freshness::Stale => " — refreshing",
        Freshness::Missing => " — loading",
    };
    let header = Row::new(vec!["User", "Action", "Result", "IP", "Time"]);
    let widths = [
        Constraint::Min(20),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(15),
        Constraint::Length(19),
    ];
    let table = styled_table(
        format!(" Audit Logs{stale} "),
        header,
        rows,
        &widths,
        palette,
    );
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_hints(frame: &mut Frame, tab: Tab, palette: &Palette, area: Rect) {
    let hints = match tab {
        Tab::Payouts => "c new · a approve · x reject · ←/→ page · 1-5 tabs · Ctrl+L sign out",
        Tab::Transactions => "Enter detail · s statement · ←/→ page · 1-5 tabs · Ctrl+L sign out",
        Tab::Accounts => "Enter detail · c new · ←/→ page · 1-5 tabs · Ctrl+L sign out",
        Tab::Users => "c new · t toggle status · ←/→ page · 1-5 tabs · Ctrl+L sign out",
        Tab::AuditLogs => "1-5 tabs · Ctrl+L sign out",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(palette.text_muted))),
        area,
    );
}
