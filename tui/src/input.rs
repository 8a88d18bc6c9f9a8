//! Keyboard dispatch: one entry point per key event.
//!
//! Modals capture input first; otherwise keys route by the current
//! screen. All mutation goes through [`App`] action methods, so this
//! module only parses keys and form contents.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use backdesk_engine::{App, ResolutionState, Screen, StatusKind, Tab};
use backdesk_types::{
    is_valid_email, rank_banks, Amount, NewAccount, NewPayout, NewUser, PasswordStrength,
    RejectReason, StatementRequest,
};

use crate::forms::TextField;
use crate::ui::{Modal, PayoutForm, RejectForm, Ui};

pub fn handle_key(app: &mut App, ui: &mut Ui, key: &KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if ui.modal.is_some() {
        handle_modal_key(app, ui, key);
        return;
    }

    match app.screen {
        Screen::Login => handle_login_key(app, ui, key),
        Screen::Otp => handle_otp_key(app, ui, key),
        Screen::ForgotPassword => handle_forgot_key(app, ui, key),
        Screen::ResetPassword => handle_reset_key(app, ui, key),
        Screen::Dashboard(tab) => handle_dashboard_key(app, ui, key, tab),
    }
}

/// Generic single-line editing. Returns false when the key is not an
/// editing key so callers can route it elsewhere.
fn edit_field(field: &mut TextField, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            field.insert(c);
            true
        }
        KeyCode::Backspace => {
            field.backspace();
            true
        }
        KeyCode::Delete => {
            field.delete();
            true
        }
        KeyCode::Left => {
            field.left();
            true
        }
        KeyCode::Right => {
            field.right();
            true
        }
        KeyCode::Home => {
            field.home();
            true
        }
        KeyCode::End => {
            field.end();
            true
        }
        _ => false,
    }
}

// ---- auth screens --------------------------------------------------------

fn handle_login_key(app: &mut App, ui: &mut Ui, key: &KeyEvent) {
    if key.code == KeyCode::Char('f') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.screen = Screen::ForgotPassword;
        app.clear_status();
        return;
    }
    match key.code {
        KeyCode::Tab => ui.login.focus.next(),
        KeyCode::BackTab => ui.login.focus.previous(),
        KeyCode::Enter => {
            app.submit_login(ui.login.email.value(), ui.login.password.value());
        }
        _ => {
            let field = if ui.login.focus.is(0) {
                &mut ui.login.email
            } else {
                &mut ui.login.password
            };
            edit_field(field, key);
        }
    }
}

fn handle_otp_key(app: &mut App, ui: &mut Ui, key: &KeyEvent) {
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.resend_otp();
        return;
    }
    match key.code {
        KeyCode::Esc => {
            ui.otp.code.clear();
            app.abandon_challenge();
        }
        KeyCode::Enter => {
            // Clear on dispatch so a rejected code never lingers.
            if app.submit_otp(ui.otp.code.value()) {
                ui.otp.code.clear();
            }
        }
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if ui.otp.code.value().chars().count() < 6 {
                ui.otp.code.insert(c);
            }
        }
        KeyCode::Backspace => ui.otp.code.backspace(),
        _ => {}
    }
}

fn handle_forgot_key(app: &mut App, ui: &mut Ui, key: &KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.screen = Screen::Login;
            app.clear_status();
        }
        KeyCode::Enter => app.submit_forgot_password(ui.forgot.email.value()),
        _ => {
            edit_field(&mut ui.forgot.email, key);
        }
    }
}

fn handle_reset_key(app: &mut App, ui: &mut Ui, key: &KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.screen = Screen::Login;
            app.clear_status();
        }
        KeyCode::Tab => ui.reset.focus.next(),
        KeyCode::BackTab => ui.reset.focus.previous(),
        KeyCode::Enter => app.submit_reset_password(
            ui.reset.token.value(),
            ui.reset.email.value(),
            ui.reset.password.value(),
        ),
        _ => {
            let field = match ui.reset.focus.index {
                0 => &mut ui.reset.token,
                1 => &mut ui.reset.email,
                _ => &mut ui.reset.password,
            };
            edit_field(field, key);
        }
    }
}

// ---- dashboard -----------------------------------------------------------

fn handle_dashboard_key(app: &mut App, ui: &mut Ui, key: &KeyEvent, tab: Tab) {
    if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.logout();
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(c @ '1'..='5') => {
            let index = (c as usize) - ('1' as usize);
            app.select_tab(Tab::ALL[index]);
        }
        KeyCode::Tab => {
            let current = Tab::ALL.iter().position(|t| *t == tab).unwrap_or(0);
            app.select_tab(Tab::ALL[(current + 1) % Tab::ALL.len()]);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            *ui.selection.for_tab_mut(tab) += 1;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let selection = ui.selection.for_tab_mut(tab);
            *selection = selection.saturating_sub(1);
        }
        KeyCode::Right => {
            app.next_page(tab);
            *ui.selection.for_tab_mut(tab) = 0;
        }
        KeyCode::Left => {
            app.previous_page(tab);
            *ui.selection.for_tab_mut(tab) = 0;
        }
        KeyCode::Char('c') => match tab {
            Tab::Payouts => {
                app.ensure_banks();
                ui.modal = Some(Modal::CreatePayout(Box::default()));
            }
            Tab::Accounts => ui.modal = Some(Modal::CreateAccount(Default::default())),
            Tab::Users => ui.modal = Some(Modal::CreateUser(Default::default())),
            _ => {}
        },
        KeyCode::Enter if tab == Tab::Payouts => {
            let selected = app
                .caches
                .payout_pages
                .get(&app.cursors.payouts)
                .and_then(|page| page.items.get(ui.selection.payouts))
                .map(|p| p.id.clone());
            if let Some(id) = selected {
                app.ensure_payout_detail(&id);
                ui.modal = Some(Modal::PayoutDetail(id));
            }
        }
        KeyCode::Enter if tab == Tab::Transactions => {
            let selected = app
                .caches
                .transaction_pages
                .get(&app.cursors.transactions)
                .and_then(|page| page.items.get(ui.selection.transactions))
                .map(|t| t.id.clone());
            if let Some(id) = selected {
                app.ensure_transaction_detail(&id);
                ui.modal = Some(Modal::TransactionDetail(id));
            }
        }
        KeyCode::Enter if tab == Tab::Accounts => {
            let selected = app
                .caches
                .account_pages
                .get(&app.cursors.accounts)
                .and_then(|page| page.items.get(ui.selection.accounts))
                .map(|a| a.id.clone());
            if let Some(id) = selected {
                app.ensure_account_detail(&id);
                ui.modal = Some(Modal::AccountDetail(id));
            }
        }
        KeyCode::Char('a') if tab == Tab::Payouts => {
            let selected = app
                .caches
                .payout_pages
                .get(&app.cursors.payouts)
                .and_then(|page| page.items.get(ui.selection.payouts))
                .map(|p| (p.id.clone(), p.is_actionable()));
            match selected {
                Some((id, true)) => app.approve_payout(id),
                Some((_, false)) => {
                    app.set_status(StatusKind::Error, "payout is not awaiting approval");
                }
                None => {}
            }
        }
        KeyCode::Char('x') if tab == Tab::Payouts => {
            let selected = app
                .caches
                .payout_pages
                .get(&app.cursors.payouts)
                .and_then(|page| page.items.get(ui.selection.payouts))
                .map(|p| (p.id.clone(), p.is_actionable()));
            match selected {
                Some((id, true)) => {
                    ui.modal = Some(Modal::RejectPayout(RejectForm {
                        payout: id,
                        reason: TextField::default(),
                    }));
                }
                Some((_, false)) => {
                    app.set_status(StatusKind::Error, "payout is not awaiting approval");
                }
                None => {}
            }
        }
        KeyCode::Char('t') if tab == Tab::Users => {
            let selected = app
                .caches
                .user_pages
                .get(&app.cursors.users)
                .and_then(|page| page.items.get(ui.selection.users))
                .map(|u| (u.id.clone(), u.status));
            if let Some((id, status)) = selected {
                app.toggle_user_status(id, status);
            }
        }
        KeyCode::Char('s') if tab == Tab::Transactions => {
            ui.modal = Some(Modal::Statement(Default::default()));
        }
        _ => {}
    }
}

// ---- modals --------------------------------------------------------------

fn handle_modal_key(app: &mut App, ui: &mut Ui, key: &KeyEvent) {
    let Some(mut modal) = ui.modal.take() else {
        return;
    };
    let keep = match &mut modal {
        Modal::PayoutDetail(_) | Modal::TransactionDetail(_) | Modal::AccountDetail(_) => {
            !matches!(key.code, KeyCode::Esc | KeyCode::Enter)
        }
        Modal::CreatePayout(form) => handle_create_payout_key(app, form, key),
        Modal::RejectPayout(form) => handle_reject_key(app, form, key),
        Modal::CreateAccount(form) => handle_create_account_key(app, form, key),
        Modal::CreateUser(form) => handle_create_user_key(app, form, key),
        Modal::Statement(form) => handle_statement_key(app, form, key),
    };
    if keep {
        ui.modal = Some(modal);
    }
}

fn selected_bank_code(form: &PayoutForm) -> String {
    form.selected_bank
        .as_ref()
        .map(|b| b.bank_code.clone())
        .unwrap_or_default()
}

#[allow(clippy::too_many_lines)]
fn handle_create_payout_key(app: &mut App, form: &mut PayoutForm, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.resolver.reset();
            return false;
        }
        KeyCode::Tab => form.focus.next(),
        KeyCode::BackTab => form.focus.previous(),
        KeyCode::Down if form.focus.is(2) => {
            let count = app
                .caches
                .banks
                .get(&())
                .map_or(0, |banks| rank_banks(banks, form.bank_query.value()).len());
            if form.bank_cursor + 1 < count.min(5) {
                form.bank_cursor += 1;
            }
        }
        KeyCode::Up if form.focus.is(2) => {
            form.bank_cursor = form.bank_cursor.saturating_sub(1);
        }
        KeyCode::Enter if form.focus.is(2) => {
            let picked = app.caches.banks.get(&()).and_then(|banks| {
                rank_banks(banks, form.bank_query.value())
                    .get(form.bank_cursor)
                    .map(|b| (*b).clone())
            });
            if let Some(bank) = picked {
                form.bank_query.set(bank.bank_name.clone());
                form.selected_bank = Some(bank);
                form.bank_cursor = 0;
                form.focus.next();
                app.resolution_input_changed(
                    form.account_number.value(),
                    &selected_bank_code(form),
                );
            }
        }
        KeyCode::Enter => {
            let amount = match Amount::parse(form.amount.value()) {
                Ok(amount) if amount.is_positive() => amount,
                _ => {
                    app.set_status(StatusKind::Error, "enter a positive amount");
                    return true;
                }
            };
            let Some(bank) = form.selected_bank.clone() else {
                app.set_status(StatusKind::Error, "pick a bank from the list");
                return true;
            };
            let ResolutionState::Resolved(resolved) = app.resolver.state().clone() else {
                app.set_status(StatusKind::Error, "wait for the account name to resolve");
                return true;
            };
            let narration = form.narration.value().trim();
            app.create_payout(NewPayout {
                amount,
                currency: "NGN".to_owned(),
                beneficiary_account_number: form.account_number.value().to_owned(),
                beneficiary_account_name: resolved.account_name,
                beneficiary_bank_code: bank.bank_code,
                bank_name: bank.bank_name,
                narration: (!narration.is_empty()).then(|| narration.to_owned()),
            });
            app.resolver.reset();
            return false;
        }
        _ => {
            let edited = match form.focus.index {
                0 => edit_field(&mut form.amount, key),
                1 => edit_field(&mut form.account_number, key),
                2 => {
                    let edited = edit_field(&mut form.bank_query, key);
                    if edited {
                        form.selected_bank = None;
                        form.bank_cursor = 0;
                    }
                    edited
                }
                _ => edit_field(&mut form.narration, key),
            };
            // Any change to the account number or bank restarts the
            // debounced name resolution.
            if edited && (form.focus.is(1) || form.focus.is(2)) {
                app.resolution_input_changed(
                    form.account_number.value(),
                    &selected_bank_code(form),
                );
            }
        }
    }
    true
}

fn handle_reject_key(app: &mut App, form: &mut RejectForm, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => false,
        KeyCode::Enter => match RejectReason::new(form.reason.value()) {
            Ok(reason) => {
                app.reject_payout(form.payout.clone(), reason);
                false
            }
            Err(e) => {
                app.set_status(StatusKind::Error, e.to_string());
                true
            }
        },
        _ => {
            edit_field(&mut form.reason, key);
            true
        }
    }
}

fn handle_create_account_key(
    app: &mut App,
    form: &mut crate::ui::AccountForm,
    key: &KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Esc => false,
        KeyCode::Tab => {
            form.focus.next();
            true
        }
        KeyCode::BackTab => {
            form.focus.previous();
            true
        }
        KeyCode::Enter => {
            let name = form.name.value().trim();
            if name.is_empty() {
                app.set_status(StatusKind::Error, "account name is required");
                return true;
            }
            let currency = form.currency.value().trim();
            let reference = form.reference.value().trim();
            app.create_account(NewAccount {
                account_name: name.to_owned(),
                currency: if currency.is_empty() {
                    "NGN".to_owned()
                } else {
                    currency.to_owned()
                },
                reference: (!reference.is_empty()).then(|| reference.to_owned()),
            });
            false
        }
        _ => {
            let field = match form.focus.index {
                0 => &mut form.name,
                1 => &mut form.currency,
                _ => &mut form.reference,
            };
            edit_field(field, key);
            true
        }
    }
}

fn handle_create_user_key(
    app: &mut App,
    form: &mut crate::ui::UserForm,
    key: &KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Tab => form.focus.next(),
        KeyCode::BackTab => form.focus.previous(),
        KeyCode::Down if form.focus.is(4) => {
            let count = app.caches.roles.get(&()).map_or(0, Vec::len);
            if form.role_cursor + 1 < count {
                form.role_cursor += 1;
            }
        }
        KeyCode::Up if form.focus.is(4) => {
            form.role_cursor = form.role_cursor.saturating_sub(1);
        }
        KeyCode::Char(' ') if form.focus.is(4) => {
            let role_key = app
                .caches
                .roles
                .get(&())
                .and_then(|roles| roles.get(form.role_cursor))
                .and_then(|role| role.key.clone());
            if let Some(role_key) = role_key {
                form.toggle_role(&role_key);
            }
        }
        KeyCode::Enter => {
            let first = form.first_name.value().trim();
            let last = form.last_name.value().trim();
            if first.is_empty() || last.is_empty() {
                app.set_status(StatusKind::Error, "first and last name are required");
                return true;
            }
            if !is_valid_email(form.email.value()) {
                app.set_status(StatusKind::Error, "enter a valid email address");
                return true;
            }
            if !PasswordStrength::check(form.password.value()).is_valid() {
                app.set_status(
                    StatusKind::Error,
                    "password needs 8+ characters with upper, lower, and a digit",
                );
                return true;
            }
            if form.selected_roles.is_empty() {
                app.set_status(StatusKind::Error, "select at least one role");
                return true;
            }
            app.create_user(NewUser {
                first_name: first.to_owned(),
                last_name: last.to_owned(),
                email: form.email.value().to_owned(),
                password: form.password.value().to_owned(),
                roles: form.selected_roles.clone(),
            });
            return false;
        }
        _ => {
            let field = match form.focus.index {
                0 => Some(&mut form.first_name),
                1 => Some(&mut form.last_name),
                2 => Some(&mut form.email),
                3 => Some(&mut form.password),
                _ => None,
            };
            if let Some(field) = field {
                edit_field(field, key);
            }
        }
    }
    true
}

fn handle_statement_key(
    app: &mut App,
    form: &mut crate::ui::StatementForm,
    key: &KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Tab => form.focus.next(),
        KeyCode::BackTab => form.focus.previous(),
        KeyCode::Char(' ') if form.focus.is(3) => form.cycle_type(),
        KeyCode::Char(' ') if form.focus.is(4) => form.cycle_format(),
        KeyCode::Enter => {
            let parsed = (
                NaiveDate::parse_from_str(form.start_date.value().trim(), "%Y-%m-%d"),
                NaiveDate::parse_from_str(form.end_date.value().trim(), "%Y-%m-%d"),
            );
            let (Ok(start_date), Ok(end_date)) = parsed else {
                app.set_status(StatusKind::Error, "dates must be YYYY-MM-DD");
                return true;
            };
            if end_date < start_date {
                app.set_status(StatusKind::Error, "end date must not precede start date");
                return true;
            }
            if !is_valid_email(form.email.value()) {
                app.set_status(StatusKind::Error, "enter a valid delivery email");
                return true;
            }
            app.request_statement(StatementRequest {
                start_date,
                end_date,
                transaction_type: form.transaction_type,
                export: form.export,
                email: form.email.value().to_owned(),
            });
            return false;
        }
        _ => {
            let field = match form.focus.index {
                0 => Some(&mut form.start_date),
                1 => Some(&mut form.end_date),
                2 => Some(&mut form.email),
                _ => None,
            };
            if let Some(field) = field {
                edit_field(field, key);
            }
        }
    }
    true
}
