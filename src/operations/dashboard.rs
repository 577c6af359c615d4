use crate::db::repository::Store;
use crate::error::StoreError;
use crate::models::transaction::{Kind, Stored, Transaction};
use crate::operations::add::record_transaction;
use crate::operations::ledger::{compute_balance, display_stored_amount, format_amount};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};
use rust_decimal::Decimal;
use std::cmp::max;
use std::io;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Kind,
    Amount,
    Description,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Kind => Focus::Amount,
            Focus::Amount => Focus::Description,
            Focus::Description => Focus::Kind,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Kind => Focus::Description,
            Focus::Amount => Focus::Kind,
            Focus::Description => Focus::Amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Info(String),
    Error(String),
}

/// Everything the dashboard shows. Render and key handling both take it
/// explicitly; nothing is kept in globals.
pub struct DashboardState {
    transactions: Vec<Transaction>,
    balance: Decimal,
    table_state: TableState,

    focus: Focus,
    kind: Kind,
    amount_input: String,
    description_input: String,

    status: Option<Status>,

    // Cached per-draw
    last_page_size: usize,
}

impl DashboardState {
    fn new(transactions: Vec<Transaction>) -> Self {
        let mut state = Self {
            transactions: Vec::new(),
            balance: Decimal::ZERO,
            table_state: TableState::default(),
            focus: Focus::Amount,
            kind: Kind::Income,
            amount_input: String::new(),
            description_input: String::new(),
            status: None,
            last_page_size: 10,
        };
        state.set_transactions(transactions);
        state
    }

    pub fn load(store: &Store) -> Result<Self, StoreError> {
        Ok(Self::new(store.read_all()?))
    }

    fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.balance = compute_balance(&transactions);
        self.transactions = transactions;
        if self.transactions.is_empty() {
            self.table_state.select(None);
        } else {
            // Newest row is last; keep it selected so it is visible after an add.
            self.table_state.select(Some(self.transactions.len() - 1));
        }
    }

    fn refresh(&mut self, store: &Store) -> Result<(), StoreError> {
        let transactions = store.read_all()?;
        self.set_transactions(transactions);
        Ok(())
    }

    fn clear_entries(&mut self) {
        self.amount_input.clear();
        self.description_input.clear();
        self.kind = Kind::Income;
        self.focus = Focus::Amount;
    }

    /// Record the form contents. Invalid amounts keep the form as typed so
    /// the user can correct it.
    fn submit(&mut self, store: &Store, today: NaiveDate) {
        match record_transaction(store, self.kind, &self.amount_input, &self.description_input, today) {
            Ok(id) => {
                let kind = self.kind;
                self.clear_entries();
                match self.refresh(store) {
                    Ok(()) => self.status = Some(Status::Info(format!("Added {} #{}", kind, id))),
                    Err(err) => {
                        error!("failed to reload transactions: {err}");
                        self.status = Some(Status::Error(err.to_string()));
                    }
                }
            }
            Err(err) => {
                warn!("transaction not added: {err}");
                self.status = Some(Status::Error(err.to_string()));
            }
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.transactions.is_empty() {
            self.table_state.select(None);
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.transactions.len().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn active_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Kind => None,
            Focus::Amount => Some(&mut self.amount_input),
            Focus::Description => Some(&mut self.description_input),
        }
    }
}

pub fn run_dashboard(store: &Store) -> Result<()> {
    let mut state = DashboardState::load(store).context("failed to load transactions")?;

    enter_terminal()?;

    let result = event_loop(store, &mut state);

    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen).context("failed to leave alternate screen")?;

    result
}

fn enter_terminal() -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    if let Err(err) = execute!(io::stdout(), EnterAlternateScreen) {
        // Raw mode is already on and nothing else will turn it off.
        let _ = disable_raw_mode();
        return Err(err).context("failed to enter alternate screen");
    }
    Ok(())
}

fn event_loop(store: &Store, state: &mut DashboardState) -> Result<()> {
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = ratatui::Terminal::new(backend).context("failed to initialize terminal")?;

    loop {
        terminal
            .draw(|frame| render(frame, state))
            .context("failed to draw dashboard")?;

        if event::poll(std::time::Duration::from_millis(200)).context("failed to poll input")? {
            if let Event::Key(key) = event::read().context("failed to read input")? {
                let today = Local::now().date_naive();
                if handle_key(store, state, key, today) {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply one key press. Returns `true` when the dashboard should close.
fn handle_key(store: &Store, state: &mut DashboardState, key: KeyEvent, today: NaiveDate) -> bool {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Tab => state.focus = state.focus.next(),
        KeyCode::BackTab => state.focus = state.focus.previous(),
        KeyCode::Enter => state.submit(store, today),
        KeyCode::Up => state.move_selection(-1),
        KeyCode::Down => state.move_selection(1),
        KeyCode::PageUp => state.move_selection(-(max(1, state.last_page_size) as i32)),
        KeyCode::PageDown => state.move_selection(max(1, state.last_page_size) as i32),
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if state.focus == Focus::Kind => {
            state.kind = state.kind.toggle();
        }
        KeyCode::Backspace => {
            if let Some(input) = state.active_input() {
                input.pop();
            }
        }
        KeyCode::Char(ch) => {
            if let Some(input) = state.active_input() {
                input.push(ch);
            }
        }
        _ => {}
    }

    false
}

fn render(frame: &mut ratatui::Frame, state: &mut DashboardState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_balance(frame, layout[0], state);
    render_form(frame, layout[1], state);
    render_table(frame, layout[2], state);
    render_footer(frame, layout[3], state);
}

fn render_balance(frame: &mut ratatui::Frame, area: Rect, state: &DashboardState) {
    let color = if state.balance < Decimal::ZERO {
        Color::Red
    } else {
        Color::Green
    };
    let line = Line::from(vec![
        Span::styled("Current Balance: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format_amount(state.balance),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL).title("Personal Finance Dashboard");
    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Center), area);
}

fn render_form(frame: &mut ratatui::Frame, area: Rect, state: &DashboardState) {
    let lines = vec![
        form_field(state.focus, Focus::Kind, "Type:", format!("< {} >", state.kind)),
        form_field(state.focus, Focus::Amount, "Amount:", state.amount_input.clone()),
        form_field(
            state.focus,
            Focus::Description,
            "Description:",
            state.description_input.clone(),
        ),
    ];

    let block = Block::default().borders(Borders::ALL).title("Add Transaction");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn form_field(current: Focus, field: Focus, label: &str, value: String) -> Line<'static> {
    let focused = current == field;
    let style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let cursor = if focused && field != Focus::Kind { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{:<13}", label), style),
        Span::raw(format!("{}{}", value, cursor)),
    ])
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, state: &mut DashboardState) {
    let block = Block::default().title("Transactions").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new([
        Cell::from("Date").style(bold),
        Cell::from("Type").style(bold),
        Cell::from("Amount").style(bold),
        Cell::from("Description").style(bold),
    ]);

    let rows = state.transactions.iter().map(|tx| {
        let color = match tx.kind {
            Stored::Valid(Kind::Income) => Color::Green,
            Stored::Valid(Kind::Expense) => Color::Red,
            Stored::Malformed(_) => Color::Yellow,
        };
        Row::new([
            Cell::from(tx.date.to_string()),
            Cell::from(tx.kind.to_string()).style(Style::default().fg(color)),
            Cell::from(display_stored_amount(&tx.amount)),
            Cell::from(tx.description.clone()),
        ])
    });

    // Leave room for the header row.
    state.last_page_size = max(1, inner.height.saturating_sub(2) as usize);

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(16),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol("> ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);

    if state.transactions.is_empty() {
        let empty = Paragraph::new("No transactions yet")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
    }
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &DashboardState) {
    let hint = "Tab/Shift+Tab field  ←/→ type  Enter add  ↑/↓ PgUp/PgDn scroll  Esc quit";
    let line = match &state.status {
        Some(Status::Info(msg)) => Line::from(vec![
            Span::styled(msg.clone(), Style::default().fg(Color::Green)),
            Span::raw("  |  "),
            Span::styled(hint, Style::default().fg(Color::DarkGray)),
        ]),
        Some(Status::Error(msg)) => Line::from(vec![
            Span::styled(msg.clone(), Style::default().fg(Color::Red)),
            Span::raw("  |  "),
            Span::styled(hint, Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    };

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(line)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}
