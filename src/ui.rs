//! TUI module using ratatui.
//!
//! Lookups run on tokio tasks and report back over a channel, so the event
//! loop keeps drawing while the network is slow.

use crate::config::Config;
use crate::export;
use crate::fetcher::WikipediaClient;
use crate::format::{self, Mode};
use crate::pipeline::{self, Entry};
use crate::state::{Action, Effect, InputMode, Status, Theme, UiState};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PAGE_SCROLL: u16 = 10;
const HELP: &str =
    "Enter/F1 Notes  F2 Summary  F3 Quiz  F4 Pro Tips  F5 Save PDF  F6 Dark mode  Esc Quit";

/// Messages from background tasks
#[derive(Debug)]
enum UiMessage {
    Fetched {
        request: u64,
        mode: Mode,
        entries: Vec<Entry>,
    },
}

/// What a key press asks for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Act(Action),
}

/// Everything effects need besides the state
struct Runtime<'a> {
    client: WikipediaClient,
    config: &'a Config,
    tx: mpsc::Sender<UiMessage>,
}

/// Run the TUI until the user quits
pub async fn run(config: &Config) -> Result<()> {
    let client = WikipediaClient::new(&config.wiki)?;
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, client, config).await;
    ratatui::restore();
    result
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    client: WikipediaClient,
    config: &Config,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(16);
    let runtime = Runtime { client, config, tx };
    let mut rng = StdRng::from_os_rng();
    let mut state = UiState::new(config.ui.theme, config.export.default_file_name.clone());
    info!("TUI started");

    loop {
        while let Ok(message) = rx.try_recv() {
            match message {
                UiMessage::Fetched {
                    request,
                    mode,
                    entries,
                } => {
                    let output = format::render_batch(mode, &entries, &mut rng);
                    state = dispatch(state, Action::Completed { request, output }, &runtime);
                }
            }
        }

        terminal.draw(|frame| draw(frame, &state))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match map_key(&state, key) {
            Some(Command::Quit) => break,
            Some(Command::Act(action)) => state = dispatch(state, action, &runtime),
            None => {}
        }
    }

    info!("TUI stopped");
    Ok(())
}

/// Apply an action and run whatever effect it produces
fn dispatch(state: UiState, action: Action, runtime: &Runtime<'_>) -> UiState {
    let (state, effect) = state.handle(action);
    match effect.and_then(|effect| run_effect(effect, runtime)) {
        Some(follow_up) => dispatch(state, follow_up, runtime),
        None => state,
    }
}

fn run_effect(effect: Effect, runtime: &Runtime<'_>) -> Option<Action> {
    match effect {
        Effect::Fetch {
            request,
            mode,
            topics,
        } => {
            debug!(request, mode = %mode, topics = topics.len(), "spawning fetch");
            let client = runtime.client.clone();
            let tx = runtime.tx.clone();
            tokio::spawn(async move {
                let entries = pipeline::fetch_all(&client, mode, &topics).await;
                if tx
                    .send(UiMessage::Fetched {
                        request,
                        mode,
                        entries,
                    })
                    .await
                    .is_err()
                {
                    warn!(request, "UI closed before fetch finished");
                }
            });
            None
        }
        Effect::Export { content, path } => {
            let outcome = export::export(&content, &path, &runtime.config.export)
                .map(|()| path)
                .map_err(|e| {
                    warn!(error = %e, "export failed");
                    e.to_string()
                });
            Some(Action::Exported(outcome))
        }
    }
}

fn map_key(state: &UiState, key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Command::Quit);
    }

    let saving = state.input_mode == InputMode::SavePath;
    let action = match key.code {
        KeyCode::Esc if saving => Action::CancelSave,
        KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Enter if saving => Action::ConfirmSave,
        KeyCode::F(_) if saving => return None,
        KeyCode::Enter | KeyCode::F(1) => Action::Generate(Mode::Notes),
        KeyCode::F(2) => Action::Generate(Mode::Summary),
        KeyCode::F(3) => Action::Generate(Mode::Quiz),
        KeyCode::F(4) => Action::Generate(Mode::Tips),
        KeyCode::F(5) => Action::BeginSave,
        KeyCode::F(6) => Action::ToggleTheme,
        KeyCode::Char(c) => Action::Type(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Up => Action::ScrollUp(1),
        KeyCode::Down => Action::ScrollDown(1),
        KeyCode::PageUp => Action::ScrollUp(PAGE_SCROLL),
        KeyCode::PageDown => Action::ScrollDown(PAGE_SCROLL),
        _ => return None,
    };
    Some(Command::Act(action))
}

fn theme_style(theme: Theme) -> Style {
    match theme {
        Theme::Light => Style::default().fg(Color::Black).bg(Color::White),
        Theme::Dark => Style::default()
            .fg(Color::Rgb(230, 230, 230))
            .bg(Color::Rgb(30, 30, 30)),
    }
}

fn draw(frame: &mut Frame, state: &UiState) {
    let base = theme_style(state.theme);
    let [title_area, input_area, output_area, help_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from("BharatGPT - Wikipedia Notes Generator").centered())
            .style(base.add_modifier(Modifier::BOLD)),
        title_area,
    );

    draw_input(frame, input_area, state, base);

    let output = Paragraph::new(state.buffer.as_str())
        .block(Block::bordered().title(if state.is_busy() {
            " Output (working...) "
        } else {
            " Output "
        }))
        .style(base)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    frame.render_widget(output, output_area);

    frame.render_widget(Paragraph::new(HELP).style(base.fg(Color::DarkGray)), help_area);

    let (text, color) = match &state.status {
        Status::Idle => (String::new(), Color::Reset),
        Status::Busy(message) => (message.clone(), Color::Yellow),
        Status::Info(message) => (message.clone(), Color::Green),
        Status::Error(message) => (format!("Error: {}", message), Color::Red),
    };
    frame.render_widget(Paragraph::new(text).style(base.fg(color)), status_area);
}

fn draw_input(frame: &mut Frame, area: Rect, state: &UiState, base: Style) {
    let (title, text) = match state.input_mode {
        InputMode::Topic => (" Enter Topic (comma-separated for a batch) ", &state.topic_input),
        InputMode::SavePath => (" Save as PDF ", &state.save_path_input),
    };
    frame.render_widget(
        Paragraph::new(text.as_str())
            .block(Block::bordered().title(title))
            .style(base),
        area,
    );

    let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    let x = area
        .x
        .saturating_add(1)
        .saturating_add(width)
        .min(area.right().saturating_sub(2));
    frame.set_cursor_position((x, area.y + 1));
}
