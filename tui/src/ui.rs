//! UI-local state: form contents, table selections, and the open modal.
//!
//! The engine owns data and session state; everything here is
//! presentation state that dies with the process.

use backdesk_engine::Tab;
use backdesk_types::{AccountId, Bank, ExportFormat, PayoutId, TransactionId, TransactionType};

use crate::forms::{Focus, TextField};

#[derive(Default)]
pub struct LoginForm {
    pub email: TextField,
    pub password: TextField,
    pub focus: Focus,
}

impl LoginForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            email: TextField::default(),
            password: TextField::masked(),
            focus: Focus::new(2),
        }
    }
}

#[derive(Default)]
pub struct OtpForm {
    pub code: TextField,
}

#[derive(Default)]
pub struct ForgotForm {
    pub email: TextField,
}

pub struct ResetForm {
    pub token: TextField,
    pub email: TextField,
    pub password: TextField,
    pub focus: Focus,
}

impl Default for ResetForm {
    fn default() -> Self {
        Self {
            token: TextField::default(),
            email: TextField::default(),
            password: TextField::masked(),
            focus: Focus::new(3),
        }
    }
}

/// Selected row per tab, clamped against the rendered row count at draw
/// time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection {
    pub payouts: usize,
    pub transactions: usize,
    pub accounts: usize,
    pub users: usize,
    pub audit: usize,
}

impl Selection {
    pub fn for_tab_mut(&mut self, tab: Tab) -> &mut usize {
        match tab {
            Tab::Payouts => &mut self.payouts,
            Tab::Transactions => &mut self.transactions,
            Tab::Accounts => &mut self.accounts,
            Tab::Users => &mut self.users,
            Tab::AuditLogs => &mut self.audit,
        }
    }

    #[must_use]
    pub const fn for_tab(&self, tab: Tab) -> usize {
        match tab {
            Tab::Payouts => self.payouts,
            Tab::Transactions => self.transactions,
            Tab::Accounts => self.accounts,
            Tab::Users => self.users,
            Tab::AuditLogs => self.audit,
        }
    }
}

pub struct PayoutForm {
    pub amount: TextField,
    pub account_number: TextField,
    pub bank_query: TextField,
    pub narration: TextField,
    /// Cursor into the ranked bank dropdown.
    pub bank_cursor: usize,
    pub selected_bank: Option<Bank>,
    pub focus: Focus,
}

impl Default for PayoutForm {
    fn default() -> Self {
        Self {
            amount: TextField::default(),
            account_number: TextField::default(),
            bank_query: TextField::default(),
            narration: TextField::default(),
            bank_cursor: 0,
            selected_bank: None,
            focus: Focus::new(4),
        }
    }
}

pub struct RejectForm {
    pub payout: PayoutId,
    pub reason: TextField,
}

pub struct AccountForm {
    pub name: TextField,
    pub currency: TextField,
    pub reference: TextField,
    pub focus: Focus,
}

impl Default for AccountForm {
    fn default() -> Self {
        let mut currency = TextField::default();
        currency.set("NGN");
        Self {
            name: TextField::default(),
            currency,
            reference: TextField::default(),
            focus: Focus::new(3),
        }
    }
}

pub struct UserForm {
    pub first_name: TextField,
    pub last_name: TextField,
    pub email: TextField,
    pub password: TextField,
    /// Cursor into the role catalogue list.
    pub role_cursor: usize,
    pub selected_roles: Vec<String>,
    pub focus: Focus,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            first_name: TextField::default(),
            last_name: TextField::default(),
            email: TextField::default(),
            password: TextField::masked(),
            role_cursor: 0,
            selected_roles: Vec::new(),
            focus: Focus::new(5),
        }
    }
}

impl UserForm {
    pub fn toggle_role(&mut self, key: &str) {
        if let Some(pos) = self.selected_roles.iter().position(|r| r == key) {
            self.selected_roles.remove(pos);
        } else {
            self.selected_roles.push(key.to_owned());
        }
    }
}

pub struct StatementForm {
    pub start_date: TextField,
    pub end_date: TextField,
    pub email: TextField,
    pub transaction_type: Option<TransactionType>,
    pub export: ExportFormat,
    pub focus: Focus,
}

impl Default for StatementForm {
    fn default() -> Self {
        Self {
            start_date: TextField::default(),
            end_date: TextField::default(),
            email: TextField::default(),
            transaction_type: None,
            export: ExportFormat::Pdf,
            focus: Focus::new(5),
        }
    }
}

impl StatementForm {
    pub fn cycle_type(&mut self) {
        self.transaction_type = match self.transaction_type {
            None => Some(TransactionType::Credit),
            Some(TransactionType::Credit) => Some(TransactionType::Debit),
            Some(TransactionType::Debit) => None,
        };
    }

    pub fn cycle_format(&mut self) {
        self.export = match self.export {
            ExportFormat::Pdf => ExportFormat::Csv,
            ExportFormat::Csv => ExportFormat::Pdf,
        };
    }
}

pub enum Modal {
    PayoutDetail(PayoutId),
    TransactionDetail(TransactionId),
    AccountDetail(AccountId),
    CreatePayout(Box<PayoutForm>),
    RejectPayout(RejectForm),
    CreateAccount(AccountForm),
    CreateUser(UserForm),
    Statement(StatementForm),
}

/// All transient presentation state.
pub struct Ui {
    pub login: LoginForm,
    pub otp: OtpForm,
    pub forgot: ForgotForm,
    pub reset: ResetForm,
    pub selection: Selection,
    pub modal: Option<Modal>,
    /// Frame counter for the spinner.
    pub tick: usize,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            login: LoginForm::new(),
            otp: OtpForm::default(),
            forgot: ForgotForm::default(),
            reset: ResetForm::default(),
            selection: Selection::default(),
            modal: None,
            tick: 0,
        }
    }
}

impl Ui {
    pub fn close_modal(&mut self) {
        self.modal = None;
    }
}
