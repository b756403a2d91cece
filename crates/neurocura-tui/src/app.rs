use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use neurocura_core::{ApplyOutcome, ChatController, CoreError, EditStatus};
use neurocura_session::{ChatSession, LoadReport};
use tracing::{error, info, warn};

pub const STATUS_READY: &str = "Ready";
pub const STATUS_PROCESSING: &str = "Processing...";
pub const STATUS_REGENERATING: &str = "Regenerating response...";
pub const STATUS_REGENERATED: &str = "Response regenerated";
pub const STATUS_ERROR: &str = "Error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sessions,
    Messages,
}

impl Focus {
    fn toggle(self) -> Self {
        match self {
            Focus::Sessions => Focus::Messages,
            Focus::Messages => Focus::Sessions,
        }
    }
}

/// What Enter does with the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Message,
    Edit { index: usize },
    Rename,
    ImportPath,
    ExportPath,
}

impl InputMode {
    pub fn title(&self) -> String {
        match self {
            InputMode::Message => "Message".to_string(),
            InputMode::Edit { index } => format!("Edit message #{} (Esc to cancel)", index + 1),
            InputMode::Rename => "Rename chat (Esc to cancel)".to_string(),
            InputMode::ImportPath => "Import transcript from path (Esc to cancel)".to_string(),
            InputMode::ExportPath => "Export transcript to path (Esc to cancel)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Help,
    Error { title: String, message: String },
    History { versions: Vec<String> },
}

pub struct App {
    controller: ChatController,
    current: Option<String>,
    pub selected_message: Option<usize>,
    pub input: String,
    pub mode: InputMode,
    pub focus: Focus,
    pub popup: Option<Popup>,
    pub status: String,
    pub model: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: ChatController, report: &LoadReport, model: impl Into<String>) -> Self {
        let current = controller.list().first().map(|s| s.id().to_string());
        let status = if report.has_failures() {
            for failure in &report.failures {
                warn!("Skipped session file {}", failure);
            }
            format!(
                "{} (skipped {} unreadable session file{})",
                STATUS_READY,
                report.failures.len(),
                if report.failures.len() == 1 { "" } else { "s" }
            )
        } else {
            STATUS_READY.to_string()
        };

        Self {
            controller,
            current,
            selected_message: None,
            input: String::new(),
            mode: InputMode::Message,
            focus: Focus::Messages,
            popup: None,
            status,
            model: model.into(),
            should_quit: false,
        }
    }

    pub fn sessions(&self) -> Vec<&ChatSession> {
        self.controller.list()
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.current
            .as_deref()
            .and_then(|id| self.controller.get(id))
    }

    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_deref()?;
        self.sessions().iter().position(|s| s.id() == current)
    }

    /// Whether the current chat is waiting for a reply
    pub fn is_waiting(&self) -> bool {
        self.current
            .as_deref()
            .map(|id| self.controller.is_busy(id))
            .unwrap_or(false)
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if self.popup.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.popup = None;
            }
            return Ok(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => self.should_quit = true,
            KeyCode::Char('n') if ctrl => self.new_chat().await?,
            KeyCode::Char('e') if ctrl => self.begin_edit(),
            KeyCode::Char('r') if ctrl => self.show_history()?,
            KeyCode::Char('d') if ctrl => self.delete_selected().await?,
            KeyCode::Char('l') if ctrl => self.clear_chat().await?,
            KeyCode::Char('o') if ctrl => self.begin_input(InputMode::ImportPath, String::new()),
            KeyCode::Char('s') if ctrl => self.begin_export(),
            KeyCode::Char('u') if ctrl => self.input.clear(),
            KeyCode::F(1) => self.popup = Some(Popup::Help),
            KeyCode::F(2) => self.begin_rename(),
            KeyCode::Tab => self.focus = self.focus.toggle(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Esc => self.cancel_input(),
            KeyCode::Enter => self.submit().await?,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !ctrl => self.input.push(c),
            _ => {}
        }
        Ok(())
    }

    /// Apply finished replies
    pub async fn on_tick(&mut self) {
        for result in self.controller.pump().await {
            match result {
                Ok(outcome) => self.on_outcome(outcome),
                Err(e) => self.show_error(&e.into()),
            }
        }
    }

    fn on_outcome(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Replied { session_id, .. } => {
                if self.current.as_deref() == Some(session_id.as_str()) {
                    self.selected_message = None;
                }
                self.status = STATUS_READY.to_string();
            }
            ApplyOutcome::Regenerated { session_id, index } => {
                if self.current.as_deref() == Some(session_id.as_str()) {
                    self.selected_message = Some(index);
                }
                self.status = STATUS_REGENERATED.to_string();
            }
            ApplyOutcome::Failed { session_id, error } => {
                let title = self
                    .controller
                    .get(&session_id)
                    .map(|s| s.title().to_string())
                    .unwrap_or(session_id);
                self.status = STATUS_ERROR.to_string();
                self.popup = Some(Popup::Error {
                    title: "Request failed".to_string(),
                    message: format!("{}: {}", title, error),
                });
            }
            ApplyOutcome::Orphaned { .. } => {}
        }
    }

    /// Report an error in the status bar and, unless it is a busy rejection, a popup
    pub fn show_error(&mut self, err: &anyhow::Error) {
        if let Some(core) = err.downcast_ref::<CoreError>() {
            if core.is_busy() {
                self.status = "Still waiting for the previous response".to_string();
                return;
            }
        }

        error!("{:#}", err);
        self.status = STATUS_ERROR.to_string();
        self.popup = Some(Popup::Error {
            title: "Error".to_string(),
            message: format!("{:#}", err),
        });
    }

    async fn new_chat(&mut self) -> anyhow::Result<()> {
        let session = self.controller.new_chat(None).await?;
        self.select_session(session.id().to_string());
        self.status = STATUS_READY.to_string();
        Ok(())
    }

    fn select_session(&mut self, session_id: String) {
        self.current = Some(session_id);
        self.selected_message = None;
        if self.mode != InputMode::Message {
            self.cancel_input();
        }
    }

    fn begin_input(&mut self, mode: InputMode, initial: String) {
        self.mode = mode;
        self.input = initial;
    }

    fn cancel_input(&mut self) {
        if self.mode != InputMode::Message {
            self.mode = InputMode::Message;
            self.input.clear();
        }
    }

    fn begin_edit(&mut self) {
        let Some(index) = self.selected_message else {
            self.status = "Select a message to edit".to_string();
            return;
        };
        let Some(message) = self.current_session().and_then(|s| s.message(index)) else {
            return;
        };
        if !message.is_user() {
            self.status = "Only your own messages can be edited".to_string();
            return;
        }
        let text = message.text().to_string();
        self.begin_input(InputMode::Edit { index }, text);
    }

    fn begin_rename(&mut self) {
        if let Some(title) = self.current_session().map(|s| s.title().to_string()) {
            self.begin_input(InputMode::Rename, title);
        }
    }

    fn begin_export(&mut self) {
        if let Some(session) = self.current_session() {
            let suggestion = format!("{}.txt", session.title().replace(['/', '\\', ':'], "_"));
            self.begin_input(InputMode::ExportPath, suggestion);
        }
    }

    fn show_history(&mut self) -> anyhow::Result<()> {
        let (Some(session_id), Some(index)) = (self.current.clone(), self.selected_message) else {
            self.status = "Select a message to view its edit history".to_string();
            return Ok(());
        };
        let versions = self.controller.edit_history(&session_id, index)?;
        self.popup = Some(Popup::History { versions });
        Ok(())
    }

    fn move_selection(&mut self, delta: isize) {
        match self.focus {
            Focus::Sessions => {
                let ids: Vec<String> = self.sessions().iter().map(|s| s.id().to_string()).collect();
                if ids.is_empty() {
                    return;
                }
                let position = self.current_index().unwrap_or(0) as isize;
                let next = (position + delta).clamp(0, ids.len() as isize - 1) as usize;
                if ids.get(next) != self.current.as_ref() {
                    self.select_session(ids[next].clone());
                }
            }
            Focus::Messages => {
                let len = self.current_session().map(|s| s.len()).unwrap_or(0);
                if len == 0 {
                    self.selected_message = None;
                    return;
                }
                let last = len as isize - 1;
                let position = self.selected_message.map(|i| i as isize).unwrap_or(len as isize);
                let next = position + delta;
                self.selected_message = if next > last {
                    None
                } else {
                    Some(next.max(0) as usize)
                };
            }
        }
    }

    async fn submit(&mut self) -> anyhow::Result<()> {
        let text = std::mem::take(&mut self.input);
        let mode = std::mem::replace(&mut self.mode, InputMode::Message);

        match mode {
            InputMode::Message => self.send(text).await,
            InputMode::Edit { index } => self.edit(index, text).await,
            InputMode::Rename => {
                if let Some(id) = self.current.clone() {
                    self.controller.rename_chat(&id, &text).await?;
                }
                Ok(())
            }
            InputMode::ImportPath => {
                let path = text.trim();
                if path.is_empty() {
                    return Ok(());
                }
                let session = self.controller.import(&expand_path(path)).await?;
                info!("Imported transcript into {}", session.id());
                self.select_session(session.id().to_string());
                self.status = format!("Imported {} messages", session.len());
                Ok(())
            }
            InputMode::ExportPath => {
                let path = text.trim();
                let Some(id) = self.current.clone().filter(|_| !path.is_empty()) else {
                    return Ok(());
                };
                let path = expand_path(path);
                self.controller.export(&id, &path).await?;
                self.status = format!("Exported to {}", path.display());
                Ok(())
            }
        }
    }

    async fn send(&mut self, text: String) -> anyhow::Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let session_id = match self.current.clone() {
            Some(id) => id,
            None => {
                let session = self.controller.new_chat(None).await?;
                self.select_session(session.id().to_string());
                session.id().to_string()
            }
        };

        match self.controller.send_message(&session_id, &text).await {
            Ok(Some(_)) => {
                self.selected_message = None;
                self.status = STATUS_PROCESSING.to_string();
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                if e.is_busy() {
                    self.input = text;
                }
                Err(e.into())
            }
        }
    }

    async fn edit(&mut self, index: usize, text: String) -> anyhow::Result<()> {
        let Some(session_id) = self.current.clone() else {
            return Ok(());
        };

        match self.controller.edit_message(&session_id, index, &text).await {
            Ok(EditStatus::Regenerating(_)) => {
                self.status = STATUS_REGENERATING.to_string();
                Ok(())
            }
            Ok(EditStatus::Edited) => {
                self.status = "Message edited".to_string();
                Ok(())
            }
            Ok(EditStatus::Ignored) => Ok(()),
            Err(e) => {
                if e.is_busy() {
                    self.mode = InputMode::Edit { index };
                    self.input = text;
                }
                Err(e.into())
            }
        }
    }

    async fn delete_selected(&mut self) -> anyhow::Result<()> {
        let Some(session_id) = self.current.clone() else {
            return Ok(());
        };

        match self.focus {
            Focus::Sessions => {
                let position = self.current_index().unwrap_or(0);
                self.controller.delete_chat(&session_id).await?;
                let sessions = self.sessions();
                let next = sessions
                    .get(position)
                    .or(sessions.last())
                    .map(|s| s.id().to_string());
                self.current = next;
                self.selected_message = None;
                self.status = "Chat deleted".to_string();
            }
            Focus::Messages => {
                let Some(index) = self.selected_message else {
                    return Ok(());
                };
                self.controller.delete_message(&session_id, index).await?;
                let len = self.current_session().map(|s| s.len()).unwrap_or(0);
                self.selected_message = if len == 0 { None } else { Some(index.min(len - 1)) };
                self.status = "Message deleted".to_string();
            }
        }
        Ok(())
    }

    async fn clear_chat(&mut self) -> anyhow::Result<()> {
        if let Some(session_id) = self.current.clone() {
            self.controller.clear_chat(&session_id).await?;
            self.selected_message = None;
            self.status = "Chat cleared".to_string();
        }
        Ok(())
    }
}

fn expand_path(path: &str) -> PathBuf {
    neurocura_config::expand_tilde(path).unwrap_or_else(|| PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use neurocura_core::RequestDispatcher;
    use neurocura_llm::{ChatGateway, LlmError};
    use neurocura_session::{JsonFileStore, JsonFileStoreConfig, SessionManager};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FixedGateway(Result<&'static str, &'static str>);

    #[async_trait]
    impl ChatGateway for FixedGateway {
        fn provider_id(&self) -> &str {
            "fixed"
        }

        async fn request(&self, prompt: &str, _credentials: &str) -> neurocura_llm::Result<String> {
            match self.0 {
                Ok(reply) => Ok(format!("{} ({})", reply, prompt)),
                Err(message) => Err(LlmError::Network(message.to_string())),
            }
        }
    }

    async fn app(dir: &TempDir, gateway: FixedGateway) -> App {
        let store = JsonFileStore::new(JsonFileStoreConfig::new(dir.path()))
            .await
            .unwrap();
        let (sessions, report) = SessionManager::open(Arc::new(store)).await.unwrap();
        let controller = ChatController::new(sessions, RequestDispatcher::new(Arc::new(gateway), "key"));
        App::new(controller, &report, "gemini-1.5-flash")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    async fn settle(app: &mut App) {
        for _ in 0..200 {
            if !app.is_waiting() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            app.on_tick().await;
        }
    }

    #[tokio::test]
    async fn test_send_creates_chat_and_applies_reply() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FixedGateway(Ok("Hi there"))).await;
        assert!(app.current_session().is_none());
        assert_eq!(app.status, STATUS_READY);

        type_text(&mut app, "Hello").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.status, STATUS_PROCESSING);
        assert!(app.input.is_empty());

        settle(&mut app).await;
        let session = app.current_session().unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[1].text(), "Hi there (Hello)");
        assert_eq!(app.status, STATUS_READY);
    }

    #[tokio::test]
    async fn test_edit_flow_regenerates() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FixedGateway(Ok("Reply"))).await;

        type_text(&mut app, "Hello").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Up)).await.unwrap();
        app.handle_key(key(KeyCode::Up)).await.unwrap();
        assert_eq!(app.selected_message, Some(0));

        app.handle_key(ctrl('e')).await.unwrap();
        assert_eq!(app.mode, InputMode::Edit { index: 0 });
        assert_eq!(app.input, "Hello");

        type_text(&mut app, "!").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.status, STATUS_REGENERATING);

        settle(&mut app).await;
        assert_eq!(app.status, STATUS_REGENERATED);
        let session = app.current_session().unwrap();
        assert_eq!(session.messages()[1].text(), "Reply (Hello!)");

        app.handle_key(ctrl('r')).await.unwrap();
        assert_eq!(
            app.popup,
            Some(Popup::History {
                versions: vec!["Hello".to_string(), "Hello!".to_string()]
            })
        );
        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert!(app.popup.is_none());
    }

    #[tokio::test]
    async fn test_assistant_reply_cannot_be_edited() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FixedGateway(Ok("Reply"))).await;

        type_text(&mut app, "Hello").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Up)).await.unwrap();
        assert_eq!(app.selected_message, Some(1));

        app.handle_key(ctrl('e')).await.unwrap();
        assert_eq!(app.mode, InputMode::Message);
        assert!(app.input.is_empty());
        assert_eq!(app.status, "Only your own messages can be edited");
        assert_eq!(app.current_session().unwrap().messages()[1].text(), "Reply (Hello)");
    }

    #[tokio::test]
    async fn test_gateway_failure_shows_error_popup() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FixedGateway(Err("offline"))).await;

        type_text(&mut app, "Hello").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        settle(&mut app).await;

        assert_eq!(app.status, STATUS_ERROR);
        assert!(matches!(app.popup, Some(Popup::Error { .. })));
        assert_eq!(app.current_session().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rename_and_delete_chat() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FixedGateway(Ok("ok"))).await;

        app.handle_key(ctrl('n')).await.unwrap();
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        app.input.clear();
        type_text(&mut app, "Sleep questions").await;
        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.current_session().unwrap().title(), "Sleep questions");

        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.focus, Focus::Sessions);
        app.handle_key(ctrl('d')).await.unwrap();
        assert!(app.current_session().is_none());
        assert!(app.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir, FixedGateway(Ok("ok"))).await;

        app.handle_key(ctrl('q')).await.unwrap();
        assert!(app.should_quit);
    }
}
