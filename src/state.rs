//! UI state as a plain value.
//!
//! Every user action goes through [`UiState::handle`], which consumes the
//! state and returns the next one plus any side effect the front end must
//! run (a lookup or a file write). Nothing here touches the terminal or the
//! network.

use crate::format::Mode;
use crate::summary::Topic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Color scheme of the output pane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Which single-line field receives keystrokes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Topic,
    SavePath,
}

/// Message shown in the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Busy(String),
    Info(String),
    Error(String),
}

/// Something the user did, or something that finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Type(char),
    Backspace,
    Generate(Mode),
    /// Rendered output for a request
    Completed { request: u64, output: String },
    BeginSave,
    ConfirmSave,
    CancelSave,
    Exported(Result<PathBuf, String>),
    ToggleTheme,
    ScrollUp(u16),
    ScrollDown(u16),
}

/// Work the front end must perform on behalf of the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch {
        request: u64,
        mode: Mode,
        topics: Vec<Topic>,
    },
    Export {
        content: String,
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub topic_input: String,
    pub save_path_input: String,
    pub input_mode: InputMode,
    /// The one output buffer, replaced wholesale per action
    pub buffer: String,
    pub theme: Theme,
    pub status: Status,
    pub scroll: u16,
    /// Id of the request whose result may replace the buffer
    pub pending: Option<u64>,
    default_file_name: String,
    next_request: u64,
}

impl UiState {
    pub fn new(theme: Theme, default_file_name: impl Into<String>) -> Self {
        Self {
            topic_input: String::new(),
            save_path_input: String::new(),
            input_mode: InputMode::Topic,
            buffer: String::new(),
            theme,
            status: Status::Idle,
            scroll: 0,
            pending: None,
            default_file_name: default_file_name.into(),
            next_request: 1,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle(mut self, action: Action) -> (Self, Option<Effect>) {
        match action {
            Action::Type(c) => {
                self.active_input().push(c);
                (self, None)
            }
            Action::Backspace => {
                self.active_input().pop();
                (self, None)
            }
            Action::Generate(mode) => self.generate(mode),
            Action::Completed { request, output } => {
                if self.pending == Some(request) {
                    self.buffer = output;
                    self.scroll = 0;
                    self.pending = None;
                    self.status = Status::Idle;
                }
                (self, None)
            }
            Action::BeginSave => {
                self.input_mode = InputMode::SavePath;
                self.save_path_input = self.default_file_name.clone();
                self.status = Status::Info("Enter a file name and press Enter".to_string());
                (self, None)
            }
            Action::ConfirmSave => self.confirm_save(),
            Action::CancelSave => {
                self.input_mode = InputMode::Topic;
                self.status = Status::Idle;
                (self, None)
            }
            Action::Exported(Ok(path)) => {
                self.status = Status::Info(format!("Notes saved as {}", path.display()));
                (self, None)
            }
            Action::Exported(Err(message)) => {
                self.status = Status::Error(message);
                (self, None)
            }
            Action::ToggleTheme => {
                self.theme = self.theme.toggled();
                (self, None)
            }
            Action::ScrollUp(lines) => {
                self.scroll = self.scroll.saturating_sub(lines);
                (self, None)
            }
            Action::ScrollDown(lines) => {
                let max = self.buffer.lines().count().saturating_sub(1);
                let max = u16::try_from(max).unwrap_or(u16::MAX);
                self.scroll = self.scroll.saturating_add(lines).min(max);
                (self, None)
            }
        }
    }

    fn active_input(&mut self) -> &mut String {
        match self.input_mode {
            InputMode::Topic => &mut self.topic_input,
            InputMode::SavePath => &mut self.save_path_input,
        }
    }

    fn generate(mut self, mode: Mode) -> (Self, Option<Effect>) {
        let topics = match Topic::parse_batch(&self.topic_input) {
            Ok(topics) => topics,
            Err(e) => {
                self.status = Status::Error(e.to_string());
                return (self, None);
            }
        };

        let request = self.next_request;
        self.next_request += 1;
        self.pending = Some(request);
        self.buffer.clear();
        self.scroll = 0;
        self.status = Status::Busy(format!("Generating {}...", mode));
        (
            self,
            Some(Effect::Fetch {
                request,
                mode,
                topics,
            }),
        )
    }

    fn confirm_save(mut self) -> (Self, Option<Effect>) {
        self.input_mode = InputMode::Topic;
        let content = self.buffer.trim();
        if content.is_empty() {
            self.status = Status::Error("There is no content to save!".to_string());
            return (self, None);
        }

        let name = self.save_path_input.trim();
        let path = if name.is_empty() {
            PathBuf::from(&self.default_file_name)
        } else {
            PathBuf::from(name)
        };
        let content = content.to_string();
        self.status = Status::Busy(format!("Saving {}...", path.display()));
        (self, Some(Effect::Export { content, path }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> UiState {
        UiState::new(Theme::Light, "BharatGPT_Notes.pdf")
    }

    fn typed(mut state: UiState, text: &str) -> UiState {
        for c in text.chars() {
            state = state.handle(Action::Type(c)).0;
        }
        state
    }

    #[test]
    fn test_empty_topic_is_rejected_without_effect() {
        let (state, effect) = typed(state(), "   ").handle(Action::Generate(Mode::Notes));
        assert_eq!(effect, None);
        assert_eq!(state.status, Status::Error("Topic cannot be empty!".to_string()));
        assert!(!state.is_busy());
    }

    #[test]
    fn test_generate_requests_fetch_and_clears_buffer() {
        let mut state = typed(state(), "Mars, Venus");
        state.buffer = "old output".to_string();
        let (state, effect) = state.handle(Action::Generate(Mode::Summary));
        match effect {
            Some(Effect::Fetch { request, mode, topics }) => {
                assert_eq!(Some(request), state.pending);
                assert_eq!(mode, Mode::Summary);
                assert_eq!(topics.len(), 2);
            }
            other => panic!("unexpected effect: {:?}", other),
        }
        assert!(state.buffer.is_empty());
        assert!(state.is_busy());
    }

    #[test]
    fn test_only_latest_request_replaces_buffer() {
        let state = typed(state(), "Mars");
        let (state, _) = state.handle(Action::Generate(Mode::Notes));
        let first = state.pending.unwrap();
        let (state, _) = state.handle(Action::Generate(Mode::Tips));
        let second = state.pending.unwrap();
        assert_ne!(first, second);

        let (state, _) = state.handle(Action::Completed {
            request: first,
            output: "stale".to_string(),
        });
        assert!(state.buffer.is_empty());
        assert!(state.is_busy());

        let (state, _) = state.handle(Action::Completed {
            request: second,
            output: "fresh".to_string(),
        });
        assert_eq!(state.buffer, "fresh");
        assert!(!state.is_busy());
    }

    #[test]
    fn test_theme_toggles() {
        let (state, _) = state().handle(Action::ToggleTheme);
        assert_eq!(state.theme, Theme::Dark);
        let (state, _) = state.handle(Action::ToggleTheme);
        assert_eq!(state.theme, Theme::Light);
    }

    #[test]
    fn test_save_prompt_defaults_file_name() {
        let (state, _) = state().handle(Action::BeginSave);
        assert_eq!(state.input_mode, InputMode::SavePath);
        assert_eq!(state.save_path_input, "BharatGPT_Notes.pdf");
        let state = typed(state, "x");
        assert_eq!(state.save_path_input, "BharatGPT_Notes.pdfx");
        assert!(state.topic_input.is_empty());
    }

    #[test]
    fn test_save_with_empty_buffer_is_refused() {
        let (state, _) = state().handle(Action::BeginSave);
        let (state, effect) = state.handle(Action::ConfirmSave);
        assert_eq!(effect, None);
        assert_eq!(state.status, Status::Error("There is no content to save!".to_string()));
        assert_eq!(state.input_mode, InputMode::Topic);
    }

    #[test]
    fn test_save_exports_trimmed_buffer() {
        let mut state = state();
        state.buffer = "\n• Fact one\n• Fact two\n\n".to_string();
        let (state, _) = state.handle(Action::BeginSave);
        let (_, effect) = state.handle(Action::ConfirmSave);
        assert_eq!(
            effect,
            Some(Effect::Export {
                content: "• Fact one\n• Fact two".to_string(),
                path: PathBuf::from("BharatGPT_Notes.pdf"),
            })
        );
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut state = state();
        state.buffer = "a\nb\nc".to_string();
        let (state, _) = state.handle(Action::ScrollDown(10));
        assert_eq!(state.scroll, 2);
        let (state, _) = state.handle(Action::ScrollUp(5));
        assert_eq!(state.scroll, 0);
    }
}
