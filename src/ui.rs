use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use cycle_tracker::{
    Clock, CyclePredictor, CycleReport, ErrorKind, Outcome, PeriodHistory, PredictionConfig,
    PredictionStrategy, RoundingMode, DATE_FORMAT, DEFAULT_FORM_PERIODS, MAX_FORM_PERIODS,
    MIN_FORM_PERIODS,
};
use chrono::NaiveDate;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;

const DATE_INPUT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodRow {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Success,
    Info,
    Caption,
    Warning,
    Error,
}

impl MessageLevel {
    fn style(&self) -> Style {
        match self {
            MessageLevel::Success => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            MessageLevel::Info => Style::default().fg(Color::Cyan),
            MessageLevel::Caption => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            MessageLevel::Warning => Style::default().fg(Color::Yellow),
            MessageLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl Message {
    fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Message {
            level,
            text: text.into(),
        }
    }
}

pub struct App {
    pub rows: Vec<PeriodRow>,
    pub state: TableState,
    pub field: Field,
    pub strategy: PredictionStrategy,
    pub rounding: RoundingMode,
    pub messages: Vec<Message>,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn new(config: &PredictionConfig, clock: Arc<dyn Clock>) -> Self {
        let mut state = TableState::default();
        state.select(Some(0));

        Self {
            rows: vec![PeriodRow::default(); DEFAULT_FORM_PERIODS],
            state,
            field: Field::Start,
            strategy: config.strategy,
            rounding: config.rounding,
            messages: Vec::new(),
            clock,
        }
    }

    pub fn selected(&self) -> usize {
        self.state.selected().unwrap_or(0)
    }

    pub fn add_row(&mut self) {
        if self.rows.len() < MAX_FORM_PERIODS {
            self.rows.push(PeriodRow::default());
        }
    }

    pub fn remove_row(&mut self) {
        if self.rows.len() > MIN_FORM_PERIODS {
            self.rows.pop();
            if self.selected() >= self.rows.len() {
                self.state.select(Some(self.rows.len() - 1));
            }
        }
    }

    /// Start -> End -> next row's Start, wrapping at the bottom
    pub fn next_field(&mut self) {
        match self.field {
            Field::Start => self.field = Field::End,
            Field::End => {
                self.field = Field::Start;
                self.next_row();
            }
        }
    }

    pub fn previous_field(&mut self) {
        match self.field {
            Field::End => self.field = Field::Start,
            Field::Start => {
                self.field = Field::End;
                self.previous_row();
            }
        }
    }

    pub fn next_row(&mut self) {
        let i = self.selected();
        self.state.select(Some(if i + 1 >= self.rows.len() { 0 } else { i + 1 }));
    }

    pub fn previous_row(&mut self) {
        let i = self.selected();
        self.state.select(Some(if i == 0 { self.rows.len() - 1 } else { i - 1 }));
    }

    fn current_input(&mut self) -> &mut String {
        let i = self.selected();
        let row = &mut self.rows[i];
        match self.field {
            Field::Start => &mut row.start,
            Field::End => &mut row.end,
        }
    }

    /// Accepts only characters that can appear in YYYY-MM-DD
    pub fn input_char(&mut self, c: char) {
        if !(c.is_ascii_digit() || c == '-') {
            return;
        }
        let input = self.current_input();
        if input.len() < DATE_INPUT_LEN {
            input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.current_input().pop();
    }

    pub fn toggle_strategy(&mut self) {
        self.strategy = self.strategy.toggle();
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            *row = PeriodRow::default();
        }
        self.messages.clear();
        self.state.select(Some(0));
        self.field = Field::Start;
    }

    /// Parse the form; blank cells are allowed, malformed ones are not
    pub fn parse_rows(&self) -> std::result::Result<PeriodHistory, String> {
        let mut pairs = Vec::with_capacity(self.rows.len());

        for (i, row) in self.rows.iter().enumerate() {
            let start = parse_cell(&row.start)
                .map_err(|v| format!("Period #{}: invalid start date '{}' (expected YYYY-MM-DD)", i + 1, v))?;
            let end = parse_cell(&row.end)
                .map_err(|v| format!("Period #{}: invalid end date '{}' (expected YYYY-MM-DD)", i + 1, v))?;
            pairs.push((start, end));
        }

        Ok(PeriodHistory::from_optional_pairs(pairs))
    }

    /// "Predict Next Period" button
    pub fn submit(&mut self) {
        self.messages.clear();

        let history = match self.parse_rows() {
            Ok(history) => history,
            Err(message) => {
                self.messages.push(Message::new(MessageLevel::Error, message));
                return;
            }
        };

        let predictor = CyclePredictor::from_history(history)
            .with_strategy(self.strategy)
            .with_rounding(self.rounding)
            .with_clock(self.clock.clone());

        let report = CycleReport::build(&predictor, None);
        self.messages = messages_for(&report);
    }
}

fn parse_cell(value: &str) -> std::result::Result<Option<NaiveDate>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| value.to_string())
}

fn messages_for(report: &CycleReport) -> Vec<Message> {
    let mut messages = Vec::new();

    match &report.prediction {
        Outcome::Ok { value } => {
            messages.push(Message::new(
                MessageLevel::Success,
                format!("Predicted Start Date: {}", value.predicted_start),
            ));
            messages.push(Message::new(
                MessageLevel::Info,
                format!("Prediction Range: {}", value.range),
            ));
            messages.push(Message::new(
                MessageLevel::Caption,
                format!("Confidence: {} — Based on {}", value.confidence, value.basis),
            ));
        }
        Outcome::Unavailable {
            kind: ErrorKind::InsufficientData,
            ..
        } => messages.push(Message::new(
            MessageLevel::Warning,
            "Please enter at least two complete periods (start + end).",
        )),
        Outcome::Unavailable { message, .. } => {
            messages.push(Message::new(MessageLevel::Error, message.clone()))
        }
    }

    match &report.phase {
        Outcome::Ok { value } => messages.push(Message::new(
            MessageLevel::Info,
            format!("Today's Phase: {}", value),
        )),
        Outcome::Unavailable { message, .. } => {
            messages.push(Message::new(MessageLevel::Error, message.clone()))
        }
    }

    if let Outcome::Ok { value } = &report.fertility {
        messages.push(Message::new(
            MessageLevel::Info,
            format!("Estimated Ovulation: {}", value.ovulation_day),
        ));
        messages.push(Message::new(
            MessageLevel::Info,
            format!("Fertile Window: {}", value.window),
        ));
    }

    messages
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.submit(),
                KeyCode::Tab | KeyCode::Right => app.next_field(),
                KeyCode::BackTab | KeyCode::Left => app.previous_field(),
                KeyCode::Down => app.next_row(),
                KeyCode::Up => app.previous_row(),
                KeyCode::Backspace => app.backspace(),
                KeyCode::Char('a') => app.add_row(),
                KeyCode::Char('r') => app.remove_row(),
                KeyCode::Char('s') => app.toggle_strategy(),
                KeyCode::Char('c') => app.clear(),
                KeyCode::Char(c) => app.input_char(c),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form + results
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_form(f, content_chunks[0], app);
    render_results(f, content_chunks[1], app);
    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let strategy = match app.strategy {
        PredictionStrategy::AverageCycle => "Average of all cycles",
        PredictionStrategy::LastCycle => "Last cycle only",
    };

    let spans = vec![
        Span::styled(
            "🩸 Menstrual Cycle Predictor",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(format!("Periods: {}", app.rows.len()), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled(format!("Strategy: {}", strategy), Style::default().fg(Color::Cyan)),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Start Date", "End Date"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let selected = app.selected();
    let field = app.field;
    let active = Style::default().fg(Color::Black).bg(Color::Yellow);

    let rows = app.rows.iter().enumerate().map(|(i, row)| {
        let cell = |value: &str, this: Field| {
            let text = if value.is_empty() { "YYYY-MM-DD".to_string() } else { value.to_string() };
            let style = if i == selected && field == this {
                active
            } else if value.is_empty() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Cell::from(text).style(style)
        };

        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            cell(&row.start, Field::Start),
            cell(&row.end, Field::End),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [Constraint::Length(4), Constraint::Length(14), Constraint::Length(14)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Past Periods "),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_results(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![Line::from("")];

    if app.messages.is_empty() {
        content.push(Line::from(Span::styled(
            "  Enter at least two period start and end dates, then press Enter.",
            MessageLevel::Caption.style(),
        )));
    }

    for message in &app.messages {
        content.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(message.text.clone(), message.level.style()),
        ]));
        content.push(Line::from(""));
    }

    let results = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Prediction "),
        );

    f.render_widget(results, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let field = match app.field {
        Field::Start => "start",
        Field::End => "end",
    };

    let mut status_spans = vec![Span::styled(
        format!(" Period {}/{} ({}) ", app.selected() + 1, app.rows.len(), field),
        Style::default().fg(Color::Cyan),
    )];

    for (key, label, color) in [
        ("Enter", " Predict | ", Color::Yellow),
        ("Tab", " Field | ", Color::Yellow),
        ("a/r", " Add/Remove | ", Color::Yellow),
        ("s", " Strategy | ", Color::Yellow),
        ("c", " Clear | ", Color::Yellow),
        ("q", " Quit", Color::Red),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(color)));
        status_spans.push(Span::raw(label));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
