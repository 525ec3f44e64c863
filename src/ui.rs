use anyhow::Result;
use catdle::{
    format_countdown, AttributeVerdict, Cat, Countdown, CountdownTick, Game, GameMode,
    GuessFeedback, GuessOutcome, Verdict,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

pub struct App {
    pub game: Game,
    pub input: String,
    pub results: Vec<Cat>,
    pub results_state: TableState,
    pub countdown: Countdown,
    pub countdown_text: String,
    pub message: Option<String>,
    pub show_victory: bool,
}

impl App {
    pub fn new(game: Game) -> Self {
        let countdown = Countdown::start(game.day_clock());
        let countdown_text = format_countdown(game.time_until_reset());
        let show_victory = game.is_over();

        Self {
            game,
            input: String::new(),
            results: Vec::new(),
            results_state: TableState::default(),
            countdown,
            countdown_text,
            message: None,
            show_victory,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
        self.refresh_results();
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
        self.refresh_results();
    }

    fn refresh_results(&mut self) {
        self.results = self.game.search(&self.input).into_iter().cloned().collect();
        self.results_state
            .select(if self.results.is_empty() { None } else { Some(0) });
    }

    pub fn next(&mut self) {
        if self.results.is_empty() {
            return;
        }
        let i = match self.results_state.selected() {
            Some(i) if i + 1 < self.results.len() => i + 1,
            _ => 0,
        };
        self.results_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.results.is_empty() {
            return;
        }
        let i = match self.results_state.selected() {
            Some(0) | None => self.results.len() - 1,
            Some(i) => i - 1,
        };
        self.results_state.select(Some(i));
    }

    /// Guess the highlighted search result
    pub fn submit(&mut self) {
        let cat = match self.results_state.selected().and_then(|i| self.results.get(i)) {
            Some(cat) => cat.clone(),
            None => return,
        };

        self.message = Some(match self.game.record_guess(&cat) {
            GuessOutcome::Correct => {
                self.show_victory = true;
                format!("{} it is!", cat.name)
            }
            GuessOutcome::Incorrect if self.game.is_over() => {
                self.show_victory = true;
                format!("Out of guesses. It was {}", self.game.current_secret().name)
            }
            GuessOutcome::Incorrect => format!("Not {}", cat.name),
            GuessOutcome::Duplicate => format!("Already guessed {}", cat.name),
            GuessOutcome::Closed => "This round is over".to_string(),
        });

        self.input.clear();
        self.refresh_results();
    }

    pub fn reveal_hint(&mut self) {
        self.game.refresh();
        self.message = Some(match self.game.hint() {
            Some(source) => format!("Hint: obtained from {}", source),
            None => format!(
                "Hint unlocks after {} guesses",
                self.game.config().hint_threshold
            ),
        });
    }

    pub fn reset(&mut self) {
        self.game.reset();
        self.show_victory = false;
        self.message = Some("Progress reset".to_string());
        self.refresh_results();
    }

    pub fn new_round(&mut self) {
        if self.game.new_round() {
            self.show_victory = false;
            self.message = Some("New round".to_string());
            self.refresh_results();
        }
    }

    /// One countdown step; rolls the game over when the day flips
    pub fn on_tick(&mut self) {
        match self.countdown.tick(self.game.day_clock()) {
            CountdownTick::Remaining(left) => self.countdown_text = format_countdown(left),
            CountdownTick::Expired => {
                self.game.rollover();
                self.show_victory = self.game.is_over();
                self.message = Some(format!("New day: {}", self.game.day_key()));
                self.countdown_text = format_countdown(self.game.time_until_reset());
                self.refresh_results();
            }
            CountdownTick::Cancelled => {}
        }
    }
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
    app.countdown.cancel();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = TICK.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if app.show_victory {
                    match key.code {
                        KeyCode::Esc | KeyCode::Enter => app.show_victory = false,
                        KeyCode::Char('n') if app.game.mode() == GameMode::Infinite => {
                            app.new_round()
                        }
                        KeyCode::Char('q') => return Ok(()),
                        _ => {}
                    }
                    continue;
                }

                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if ctrl => return Ok(()),
                    KeyCode::Char('h') if ctrl => app.reveal_hint(),
                    KeyCode::Char('r') if ctrl => app.reset(),
                    KeyCode::Char('n') if ctrl => app.new_round(),
                    KeyCode::Char(c) if !ctrl => app.push_char(c),
                    KeyCode::Backspace => app.pop_char(),
                    KeyCode::Down => app.next(),
                    KeyCode::Up => app.previous(),
                    KeyCode::Enter => app.submit(),
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= TICK {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Guess input
            Constraint::Min(0),    // Results + guesses
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_input(f, chunks[1], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30), // Search results
            Constraint::Percentage(70), // Guess table
        ])
        .split(chunks[2]);

    render_results(f, content_chunks[0], app);
    render_guesses(f, content_chunks[1], app);
    render_status_bar(f, chunks[3], app);

    if app.show_victory {
        render_victory(f, f.size(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let game = &app.game;
    let mode = match game.mode() {
        GameMode::Daily => format!("Daily {}", game.day_key()),
        GameMode::Infinite => "Infinite".to_string(),
    };

    let hint_style = if game.hint_available() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let spans = vec![
        Span::styled(
            " Catdle ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled(mode, Style::default().fg(Color::Cyan)),
        Span::raw("  |  "),
        Span::styled(
            format!("Guesses {}/{}", game.attempts(), game.config().max_guesses),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled("Hint", hint_style),
        Span::raw("  |  "),
        Span::styled(
            format!("Next cat in {}", app.countdown_text),
            Style::default().fg(Color::Magenta),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Guess a cat "),
    );
    f.render_widget(input, area);
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.results.iter().map(|cat| {
        Row::new(vec![
            Cell::from(truncate(&cat.name, 28)),
            Cell::from(cat.form.clone()).style(Style::default().fg(Color::DarkGray)),
        ])
    });

    let table = Table::new(rows, [Constraint::Min(10), Constraint::Length(8)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Matches ({}) ", app.results.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.results_state);
}

fn render_guesses(f: &mut Frame, area: Rect, app: &App) {
    let headers = [
        "Cat", "Rarity", "Form", "Role", "Traits", "Attack", "Abilities", "Cost", "Version",
    ];
    let header_cells = headers.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.game.history().iter().rev().map(guess_row);

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Guesses "),
    );

    f.render_widget(table, area);
}

fn guess_row(feedback: &GuessFeedback) -> Row<'static> {
    let name_style = if feedback.correct {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut cells = vec![Cell::from(truncate(&feedback.cat.name, 20)).style(name_style)];
    cells.extend(feedback.verdicts.iter().map(|v| verdict_cell(&feedback.cat, v)));
    Row::new(cells).height(1)
}

fn verdict_cell(cat: &Cat, verdict: &AttributeVerdict) -> Cell<'static> {
    let value = verdict.attribute.value_of(cat);
    let value = if value.is_empty() { "-" } else { value };
    let text = format!("{}{}", truncate(value, 12), verdict_arrow(verdict.verdict));
    Cell::from(text).style(Style::default().fg(verdict_color(verdict.verdict)))
}

/// Arrows point toward the answer
fn verdict_arrow(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::SingleHigher => " ↑",
        Verdict::DoubleHigher => " ⇈",
        Verdict::SingleLower => " ↓",
        Verdict::DoubleLower => " ⇊",
        _ => "",
    }
}

fn verdict_color(verdict: Verdict) -> Color {
    match verdict {
        Verdict::Exact => Color::Green,
        Verdict::Partial => Color::Yellow,
        Verdict::Miss => Color::Red,
        _ => Color::Magenta,
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    if let Some(message) = &app.message {
        status_spans.push(Span::styled(format!(" {} ", message), Style::default().fg(Color::Cyan)));
        status_spans.push(Span::raw(" | "));
    }

    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Guess | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Pick | "));
    status_spans.push(Span::styled("^H", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Hint | "));
    status_spans.push(Span::styled("^R", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reset | "));
    if app.game.mode() == GameMode::Infinite {
        status_spans.push(Span::styled("^N", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" New round | "));
    }
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_victory(f: &mut Frame, area: Rect, app: &App) {
    let popup = centered_rect(50, 40, area);
    let game = &app.game;
    let secret = game.current_secret();

    let title = if game.is_won() { " You got it! " } else { " Round over " };
    let mut lines = vec![
        Line::from(Span::styled(
            secret.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{} · {} · {}", secret.rarity, secret.form, secret.source)),
        Line::from(""),
        Line::from(format!("Guesses: {}", game.attempts())),
    ];

    match game.mode() {
        GameMode::Daily => {
            lines.push(Line::from(format!("Next cat in {}", app.countdown_text)));
            lines.push(Line::from(""));
            lines.push(Line::from("Enter/Esc close · q quit"));
        }
        GameMode::Infinite => {
            lines.push(Line::from(""));
            lines.push(Line::from("n new round · Enter/Esc close · q quit"));
        }
    }

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(title),
    );

    f.render_widget(Clear, popup);
    f.render_widget(block, popup);
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

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
