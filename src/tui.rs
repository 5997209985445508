use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Terminal;
use tokio::runtime::Handle;
use tracing::debug;
use zeroize::Zeroizing;

use crate::clipboard::{self, ClipboardController, ClipboardError};
use crate::config::ClientConfig;
use crate::error::VaultError;
use crate::generator::{self, MIN_LENGTH};
use crate::models::PasswordMap;
use crate::search;
use crate::session::VaultSession;

/// Ceiling for the `+` key; longer passwords are still available from `generate -l`.
const MAX_TUI_LENGTH: usize = 128;

fn cleanup_terminal(inside_tmux: bool) -> io::Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    if !inside_tmux {
        crossterm::execute!(stdout, crossterm::event::DisableMouseCapture)?;
    }
    crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

enum Mode {
    Browse,
    Filter,
    Save(String),
    Unlock(Zeroizing<String>),
    Message(String, Instant),
}

/// Names from `entries` matching `query`, best first.
fn filtered_names(entries: &PasswordMap, query: &str) -> Vec<String> {
    search::filter_entries(entries, query)
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Copies `name`'s password, opening the system clipboard on first use.
fn copy_entry(
    controller: &mut Option<ClipboardController>,
    entries: &PasswordMap,
    name: &str,
) -> Result<String, ClipboardError> {
    if search::exact_match(entries, name).is_none() {
        return Err(ClipboardError::NotFound(name.to_string()));
    }
    if controller.is_none() {
        *controller = Some(ClipboardController::new()?);
    }
    let Some(sink) = controller.as_mut() else {
        return Err(ClipboardError::AccessFailed("clipboard unavailable".to_string()));
    };
    clipboard::copy_password(sink, entries, name).map(|found| format!("Copied '{}' to clipboard.", found))
}

fn message_for(err: &VaultError) -> String {
    match err {
        VaultError::AuthRejected | VaultError::Locked => {
            "Vault is locked. Press u to unlock.".to_string()
        }
        VaultError::Unreachable(_) => "Error communicating with the app.".to_string(),
        other => other.to_string(),
    }
}

/// Full-screen generator and vault browser. Must run on a blocking-capable
/// thread of a multi-threaded runtime (see `tokio::task::block_in_place`).
pub fn run_full_ui(session: &mut VaultSession, config: &ClientConfig) -> anyhow::Result<()> {
    let runtime = Handle::current();
    let inside_tmux = std::env::var("TMUX").is_ok();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    if !inside_tmux {
        crossterm::execute!(stdout, crossterm::event::EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    let mut list_state = ratatui::widgets::ListState::default();

    let clamp_selection = |idx: &mut usize, len: usize| {
        if len == 0 {
            *idx = 0;
        } else if *idx >= len {
            *idx = len - 1;
        }
    };

    let mut length = config.password_length.clamp(MIN_LENGTH, MAX_TUI_LENGTH);
    let mut generated = Zeroizing::new(generator::generate(length)?);
    let mut input = String::new();
    let mut selected_idx: usize = 0;
    let mut mode = Mode::Browse;
    let mut controller: Option<ClipboardController> = None;

    let mut entries: PasswordMap = match runtime.block_on(session.list_passwords()) {
        Ok(entries) => entries,
        Err(e) => {
            mode = Mode::Message(message_for(&e), Instant::now());
            PasswordMap::new()
        }
    };
    let mut filtered = filtered_names(&entries, &input);

    loop {
        list_state.select(if filtered.is_empty() { None } else { Some(selected_idx) });
        let state_label = session.state().to_string();

        terminal.draw(|f| {
            let size = f.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1), // header
                    Constraint::Length(3), // generated password
                    Constraint::Length(3), // filter/input
                    Constraint::Min(1),    // entries
                    Constraint::Length(1), // footer
                ])
                .split(size);

            let header = Paragraph::new(format!(
                "Absconditus -- {} | g generate | +/- length | s save | / filter | q quit",
                state_label
            ))
            .block(Block::default().borders(Borders::NONE));
            f.render_widget(header, chunks[0]);

            let password = Paragraph::new(generated.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Generated password ({} chars)", length)),
            );
            f.render_widget(password, chunks[1]);

            let (title, text): (String, String) = match &mode {
                Mode::Filter => ("Filter (type text, Enter to apply)".to_string(), input.clone()),
                Mode::Save(name) => ("Save generated password as (Enter to save):".to_string(), name.clone()),
                Mode::Unlock(password) => (
                    "Master password (Enter to unlock):".to_string(),
                    "*".repeat(password.chars().count()),
                ),
                Mode::Message(msg, _) => ("Message".to_string(), msg.clone()),
                Mode::Browse => ("Filter (press / to edit)".to_string(), input.clone()),
            };
            let input_widget = Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(input_widget, chunks[2]);

            let items: Vec<ListItem> = if filtered.is_empty() {
                vec![ListItem::new(Line::from(vec![Span::raw("No passwords saved yet.")]))]
            } else {
                filtered
                    .iter()
                    .map(|name| ListItem::new(Line::from(vec![Span::raw(name.as_str())])))
                    .collect()
            };
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Saved passwords"))
                .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
            f.render_stateful_widget(list, chunks[3], &mut list_state);

            let footer = Paragraph::new("Enter show | c copy | r refresh | u unlock | l drop token | j/k navigate | Ctrl+C force quit")
                .block(Block::default().borders(Borders::NONE));
            f.render_widget(footer, chunks[4]);
        })?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if crossterm::event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        cleanup_terminal(inside_tmux)?;
                        return Ok(());
                    }

                    match &mut mode {
                        Mode::Browse => match key.code {
                            KeyCode::Char('/') => mode = Mode::Filter,
                            KeyCode::Char('g') => {
                                generated = Zeroizing::new(generator::generate(length)?);
                            }
                            KeyCode::Char('+') | KeyCode::Char('=') => {
                                length = (length + 1).min(MAX_TUI_LENGTH);
                                generated = Zeroizing::new(generator::generate(length)?);
                            }
                            KeyCode::Char('-') => {
                                length = length.saturating_sub(1).max(MIN_LENGTH);
                                generated = Zeroizing::new(generator::generate(length)?);
                            }
                            KeyCode::Char('s') => mode = Mode::Save(String::new()),
                            KeyCode::Char('u') => mode = Mode::Unlock(Zeroizing::new(String::new())),
                            KeyCode::Char('r') => {
                                let connected = runtime.block_on(session.request_token()).map(|_| ());
                                let refreshed = match connected {
                                    Ok(()) => runtime.block_on(session.list_passwords()),
                                    Err(e) => Err(e),
                                };
                                match refreshed {
                                    Ok(fresh) => {
                                        entries = fresh;
                                        filtered = filtered_names(&entries, &input);
                                        clamp_selection(&mut selected_idx, filtered.len());
                                    }
                                    Err(e) => mode = Mode::Message(message_for(&e), Instant::now()),
                                }
                            }
                            KeyCode::Up | KeyCode::Char('k') => {
                                if !filtered.is_empty() { selected_idx = selected_idx.saturating_sub(1); }
                            }
                            KeyCode::Down | KeyCode::Char('j') => {
                                if !filtered.is_empty() { selected_idx = (selected_idx + 1).min(filtered.len().saturating_sub(1)); }
                            }
                            KeyCode::Home => selected_idx = 0,
                            KeyCode::End => {
                                if !filtered.is_empty() { selected_idx = filtered.len().saturating_sub(1); }
                            }
                            KeyCode::Char('c') => {
                                if let Some(name) = filtered.get(selected_idx) {
                                    let message = match copy_entry(&mut controller, &entries, name) {
                                        Ok(message) => message,
                                        Err(e) => e.to_string(),
                                    };
                                    mode = Mode::Message(message, Instant::now());
                                }
                            }
                            KeyCode::Char('l') => {
                                session.forget();
                                entries.clear();
                                filtered = filtered_names(&entries, &input);
                                clamp_selection(&mut selected_idx, filtered.len());
                                mode = Mode::Message(
                                    "Session token dropped. Press r to reconnect.".to_string(),
                                    Instant::now(),
                                );
                            }
                            KeyCode::Enter => {
                                if let Some(name) = filtered.get(selected_idx) {
                                    if let Some(password) = entries.get(name) {
                                        mode = Mode::Message(format!("{}: {}", name, password), Instant::now());
                                    }
                                }
                            }
                            KeyCode::Char('q') | KeyCode::Esc => {
                                cleanup_terminal(inside_tmux)?;
                                return Ok(());
                            }
                            _ => {}
                        },
                        Mode::Filter => match key.code {
                            KeyCode::Enter => mode = Mode::Browse,
                            KeyCode::Esc => {
                                input.clear();
                                filtered = filtered_names(&entries, &input);
                                clamp_selection(&mut selected_idx, filtered.len());
                                mode = Mode::Browse;
                            }
                            KeyCode::Backspace => {
                                input.pop();
                                filtered = filtered_names(&entries, &input);
                                clamp_selection(&mut selected_idx, filtered.len());
                            }
                            KeyCode::Char(c) => {
                                input.push(c);
                                filtered = filtered_names(&entries, &input);
                                clamp_selection(&mut selected_idx, filtered.len());
                            }
                            _ => {}
                        },
                        Mode::Save(name) => match key.code {
                            KeyCode::Esc => mode = Mode::Browse,
                            KeyCode::Backspace => { name.pop(); }
                            KeyCode::Char(c) => name.push(c),
                            KeyCode::Enter => {
                                let name = std::mem::take(name);
                                let saved = runtime.block_on(session.save_password(&name, &generated));
                                mode = match saved {
                                    Ok(()) => {
                                        debug!(entry = %name, "saved from tui");
                                        entries.insert(name, generated.as_str().to_string());
                                        filtered = filtered_names(&entries, &input);
                                        clamp_selection(&mut selected_idx, filtered.len());
                                        generated = Zeroizing::new(generator::generate(length)?);
                                        Mode::Message("Saved!".to_string(), Instant::now())
                                    }
                                    Err(e) => Mode::Message(message_for(&e), Instant::now()),
                                };
                            }
                            _ => {}
                        },
                        Mode::Unlock(password) => match key.code {
                            KeyCode::Esc => mode = Mode::Browse,
                            KeyCode::Backspace => { password.pop(); }
                            KeyCode::Char(c) => password.push(c),
                            KeyCode::Enter => {
                                let password = std::mem::take(password);
                                let connected = runtime
                                    .block_on(session.unlock_and_connect(password))
                                    .map(|_| ());
                                let unlocked = match connected {
                                    Ok(()) => runtime.block_on(session.list_passwords()),
                                    Err(e) => Err(e),
                                };
                                mode = match unlocked {
                                    Ok(fresh) => {
                                        entries = fresh;
                                        filtered = filtered_names(&entries, &input);
                                        clamp_selection(&mut selected_idx, filtered.len());
                                        Mode::Message("Vault: Unlocked".to_string(), Instant::now())
                                    }
                                    Err(VaultError::InvalidPassword) => {
                                        Mode::Message("Invalid master password.".to_string(), Instant::now())
                                    }
                                    Err(e) => Mode::Message(message_for(&e), Instant::now()),
                                };
                            }
                            _ => {}
                        },
                        Mode::Message(_, _) => mode = Mode::Browse,
                    }
                }
                Event::Mouse(mouse_event) => match mouse_event.kind {
                    MouseEventKind::ScrollUp => {
                        if !filtered.is_empty() { selected_idx = selected_idx.saturating_sub(3); }
                    }
                    MouseEventKind::ScrollDown => {
                        if !filtered.is_empty() { selected_idx = (selected_idx + 3).min(filtered.len().saturating_sub(1)); }
                    }
                    _ => {}
                },
                Event::Resize(_, _) => {
                    terminal.clear()?;
                }
                _ => {}
            }
        }

        if let Mode::Message(_, t) = &mode {
            if t.elapsed() > Duration::from_secs(3) { mode = Mode::Browse; }
        }

        if last_tick.elapsed() >= tick_rate { last_tick = Instant::now(); }
    }
}
