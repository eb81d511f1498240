use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use profile_terminal::api::LunchboxApi;
use profile_terminal::config::AppConfig;
use profile_terminal::feed::spawn_provider;
use profile_terminal::leaderboard::{LeaderboardFailure, LeaderboardPane};
use profile_terminal::location::Location;
use profile_terminal::state::{AppState, Delta, Focus, Now, ProviderCommand, apply_delta};

const SIDEBAR_WIDTH: u16 = 42;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    shown_title: String,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
            shown_title: String::new(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let now = Now::current();
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            let cmd = match key.code {
                KeyCode::Left => self.state.navigate_back(now),
                KeyCode::Right => self.state.navigate_forward(now),
                _ => None,
            };
            self.dispatch(cmd);
            return;
        }

        match key.code {
            KeyCode::F(1) => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => {
                if self.state.help_overlay {
                    self.state.help_overlay = false;
                } else if self.state.sidebar.open {
                    self.state.close_sidebar();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab => {
                let cmd = self.state.toggle_sidebar(now);
                self.dispatch(cmd);
            }
            _ => match self.state.focus {
                Focus::Input => self.on_input_key(key, now),
                Focus::Sidebar => self.on_sidebar_key(key, now),
            },
        }
    }

    fn on_input_key(&mut self, key: KeyEvent, now: Now) {
        match key.code {
            KeyCode::Enter => {
                let cmd = self.state.submit_input(now);
                self.dispatch(cmd);
            }
            KeyCode::Backspace => {
                self.state.input.pop();
            }
            KeyCode::Char(c) => self.state.input.push(c),
            _ => {}
        }
    }

    fn on_sidebar_key(&mut self, key: KeyEvent, now: Now) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.sidebar.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.sidebar.select_prev(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let cmd = self.state.load_leaderboard(true, now);
                self.dispatch(cmd);
            }
            KeyCode::Enter => {
                let cmd = self.state.open_selected_entry(now);
                self.dispatch(cmd);
            }
            KeyCode::Char('i') | KeyCode::Left => self.state.focus = Focus::Input,
            _ => {}
        }
    }

    fn dispatch(&mut self, cmd: Option<ProviderCommand>) {
        let Some(cmd) = cmd else {
            return;
        };
        let unsent = match &self.cmd_tx {
            Some(tx) => tx.send(cmd).err().map(|err| (err.0, "provider stopped")),
            None => Some((cmd, "fetch unavailable")),
        };
        if let Some((cmd, reason)) = unsent {
            self.fail_command(cmd, reason);
        }
    }

    // Settles state that was waiting on a command that never left.
    fn fail_command(&mut self, cmd: ProviderCommand, reason: &str) {
        let delta = match cmd {
            ProviderCommand::FetchProfile { account_id, .. } => Delta::ProfileFailed {
                account_id,
                error: reason.to_string(),
            },
            ProviderCommand::FetchLeaderboard => {
                Delta::LeaderboardFailed(LeaderboardFailure::Unavailable(reason.to_string()))
            }
        };
        apply_delta(&mut self.state, delta, Now::current());
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env().with_location_arg(std::env::args().nth(1));
    let mut state = AppState::new(&config);

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let cmd_tx = match LunchboxApi::new(&config) {
        Ok(api) => {
            spawn_provider(Arc::new(api), tx, cmd_rx);
            Some(cmd_tx)
        }
        Err(err) => {
            state.push_log(format!("[ERROR] {err:#}"));
            None
        }
    };

    let location = config
        .initial_location
        .as_deref()
        .map(Location::parse)
        .unwrap_or_default();
    let mut app = App::new(state, cmd_tx);
    let startup = app.state.start(location, Now::current());
    app.dispatch(startup);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend + io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta, Now::current());
        }

        if app.shown_title != app.state.title {
            execute!(terminal.backend_mut(), SetTitle(&app.state.title))?;
            app.shown_title = app.state.title.clone();
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if state.sidebar.open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(SIDEBAR_WIDTH)])
            .split(chunks[1]);
        render_profile(frame, columns[0], state);
        render_sidebar(frame, columns[1], state);
    } else {
        render_profile(frame, chunks[1], state);
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let back = if state.history.can_go_back() { "◀" } else { " " };
    let forward = if state.history.can_go_forward() { "▶" } else { " " };
    format!(
        "{}\n{back}{forward} {}",
        state.title,
        state.location_label()
    )
}

fn footer_text(state: &AppState) -> String {
    match state.focus {
        Focus::Input => {
            "Enter Load | Tab Leaderboard | Alt+←/→ History | F1 Help | Esc Quit".to_string()
        }
        Focus::Sidebar => {
            "j/k/↑/↓ Move | Enter Open | r Refresh | i Input | Tab Close | Alt+←/→ History | F1 Help"
                .to_string()
        }
    }
}

fn render_profile(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Player Profile").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(inner);

    let input_style = if state.focus == Focus::Input {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let cursor = if state.focus == Focus::Input { "_" } else { "" };
    let input = Paragraph::new(format!("{}{cursor}", state.input))
        .style(input_style)
        .block(Block::default().title("Account ID").borders(Borders::ALL));
    frame.render_widget(input, rows[0]);

    let label_style = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();
    for (key, value) in state.profile.fields() {
        let value = if key == "displayName" {
            state.headline()
        } else {
            value
        };
        let mut line_style = Style::default();
        // Draws are not part of the totals; the page shows them struck through.
        if key == "draws" {
            line_style = line_style.add_modifier(Modifier::CROSSED_OUT);
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", field_label(key)), label_style),
            Span::styled(value.to_string(), line_style),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), rows[1]);
}

fn field_label(key: &str) -> &'static str {
    match key {
        "displayName" => "Player",
        "rank" => "Rank",
        "score" => "Score",
        "wins" => "Wins",
        "losses" => "Losses",
        "draws" => "Draws",
        "totalGames" => "Total Games",
        "winPercentage" => "Win %",
        "winStreak" => "Win Streak",
        "lossStreak" => "Loss Streak",
        "maxWinStreak" => "Best Streak",
        "maxLossStreak" => "Worst Streak",
        _ => "",
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let title_style = if state.focus == Focus::Sidebar {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(Span::styled("Top Players", title_style))
        .borders(Borders::ALL);

    let widths = [
        Constraint::Length(6),
        Constraint::Min(12),
        Constraint::Length(8),
    ];
    let header = Row::new(vec!["Rank", "Player", "Score"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = match &state.sidebar.pane {
        LeaderboardPane::Idle => Vec::new(),
        LeaderboardPane::Loading => vec![Row::new(vec![Cell::from("Loading...")])],
        LeaderboardPane::Warning(msg) => vec![Row::new(vec![Cell::from(*msg)])],
        LeaderboardPane::Rows(rows) => {
            let inner_height = area.height.saturating_sub(3) as usize;
            let (start, end) = visible_range(state.sidebar.selected, rows.len(), inner_height);
            rows[start..end]
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    let style = if start + i == state.sidebar.selected {
                        Style::default().fg(Color::White).bg(Color::DarkGray)
                    } else {
                        Style::default()
                    };
                    Row::new(vec![
                        Cell::from(row.rank.clone()),
                        Cell::from(row.display_name.clone())
                            .style(Style::default().add_modifier(Modifier::UNDERLINED)),
                        Cell::from(row.score.clone()),
                    ])
                    .style(style)
                })
                .collect()
        }
    };

    // Warnings and the loading row span the whole table width.
    let table = match &state.sidebar.pane {
        LeaderboardPane::Loading | LeaderboardPane::Warning(_) => {
            Table::new(rows, [Constraint::Percentage(100)]).block(block)
        }
        _ => Table::new(rows, widths).header(header).block(block),
    };
    frame.render_widget(table, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Player Profile - Help",
        "",
        "Type an account ID and press Enter to load it.",
        "Results are cached for an hour; Enter always refetches.",
        "",
        "Global:",
        "  Tab          Open/close leaderboard",
        "  Alt+← / →    Back / forward",
        "  F1           Toggle help",
        "  Esc          Close panel / quit",
        "  Ctrl+C       Quit",
        "",
        "Leaderboard:",
        "  j/k or ↑/↓   Move",
        "  Enter        Load selected player",
        "  r            Refresh (clears cached profiles)",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
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

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
