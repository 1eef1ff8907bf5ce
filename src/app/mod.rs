// Application state machine.
//
// `App` owns the view-model for all five views. Key presses and command
// completions are applied one at a time on the UI thread:
//
//   key ──> handle_key ──> Option<Request> ──> worker thread
//                                                   │
//   complete <──────────── Completion <─────────────┘
//
// Each request carries the epoch it was issued under. Changing view or
// issuing another request advances the epoch, so a result that arrives for
// an abandoned screen is recognized and dropped.

pub mod command;
pub mod field;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::{Credentials, RemoteService, Session};
use crate::error::Category;
use crate::records::{Issue, NewIssue};

pub use command::{Command, Completion, Outcome, Request};
pub use field::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Auth,
    Menu,
    CreateIssue,
    ListIssues,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFocus {
    Email,
    Name,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueFocus {
    Title,
    Description,
}

/// Payload of the Message view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error { category: Category, message: String },
}

pub const MENU_ITEMS: [(&str, &str); 2] = [
    ("Create Issue", "Open a form to create a new issue"),
    ("List My Issues", "View issues you created"),
];

const MENU_CREATE: usize = 0;
const MENU_LIST: usize = 1;

pub struct App<S> {
    service: S,
    session: Option<Session>,
    view: View,
    epoch: u64,
    pending: bool,
    spinner_frame: usize,
    should_quit: bool,

    /// Inline validation or auth error for the current form.
    error: Option<String>,
    /// One-line status shown under the menu until the next key press.
    flash: Option<String>,
    notice: Option<Notice>,

    auth_mode: AuthMode,
    auth_focus: AuthFocus,
    email: Field,
    password: Field,
    name: Field,

    menu_index: usize,

    issue_focus: IssueFocus,
    title: Field,
    description: Field,

    issues: Vec<Issue>,
    list_scroll: u16,
}

impl<S: RemoteService> App<S> {
    /// `session` is the result of the bootstrap sign-in, if any. Without one
    /// the app starts on the Auth view.
    pub fn new(service: S, session: Option<Session>) -> Self {
        let view = if session.is_some() { View::Menu } else { View::Auth };
        let mut app = App {
            service,
            session,
            view,
            epoch: 0,
            pending: false,
            spinner_frame: 0,
            should_quit: false,
            error: None,
            flash: None,
            notice: None,
            auth_mode: AuthMode::SignIn,
            auth_focus: AuthFocus::Email,
            email: Field::new("Email", "email@example.com"),
            password: Field::new("Password", "password").masked(),
            name: Field::new("Name", "display name"),
            menu_index: 0,
            issue_focus: IssueFocus::Title,
            title: Field::new("Title", "Issue title"),
            description: Field::new("Description", "Describe the issue..."),
            issues: Vec::new(),
            list_scroll: 0,
        };
        app.email.set_focused(true);
        app
    }

    /// Client handle used to run commands. Workers get a clone.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Apply one key press. Returns the background request it started, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Request> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }
        self.flash = None;
        match self.view {
            View::Auth => self.auth_key(key),
            View::Menu => self.menu_key(key),
            View::CreateIssue => self.create_key(key),
            View::ListIssues => {
                self.list_key(key);
                None
            }
            View::Message => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.notice = None;
                    self.set_view(View::Menu);
                }
                None
            }
        }
    }

    /// Apply a finished request. Results from an older epoch are dropped.
    pub fn complete(&mut self, completion: Completion) {
        if !self.pending || completion.epoch != self.epoch {
            tracing::warn!(
                epoch = completion.epoch,
                current = self.epoch,
                "discarding stale result"
            );
            return;
        }
        self.pending = false;

        match completion.outcome {
            Outcome::Authenticated { session, greeting } => {
                self.service.set_session(&session);
                self.session = Some(session);
                self.password.clear();
                self.set_view(View::Menu);
                self.flash = Some(greeting);
            }
            Outcome::Failed { message, .. } if self.view == View::Auth => {
                self.error = Some(message);
            }
            Outcome::Failed { category, message } => {
                self.show_notice(Notice::Error { category, message })
            }
            Outcome::IssueCreated(issue) => {
                self.title.clear();
                self.description.clear();
                self.show_notice(Notice::Info(format!(
                    "Issue #{} created: {}",
                    issue.id, issue.title
                )));
            }
            Outcome::IssuesLoaded(issues) => {
                tracing::debug!(count = issues.len(), "showing issues");
                self.issues = issues;
                self.list_scroll = 0;
                self.set_view(View::ListIssues);
            }
        }
    }

    /// Advance the loading animation while a request is outstanding.
    pub fn tick(&mut self) {
        if self.pending {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    fn auth_key(&mut self, key: KeyEvent) -> Option<Request> {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab => {
                self.cycle_auth_focus();
                None
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.toggle_auth_mode();
                None
            }
            KeyCode::Enter => self.submit_auth(),
            _ => {
                self.focused_auth_field().input(key);
                None
            }
        }
    }

    fn submit_auth(&mut self) -> Option<Request> {
        let email = self.email.value().trim().to_string();
        let password = self.password.value();
        let name = self.name.value().trim().to_string();
        let signing_up = self.auth_mode == AuthMode::SignUp;
        if email.is_empty() || password.is_empty() || (signing_up && name.is_empty()) {
            self.error = Some("Fill in all required fields".into());
            return None;
        }
        self.error = None;

        let credentials = Credentials::new(email, password);
        let command = if signing_up {
            Command::SignUp { credentials, name }
        } else {
            Command::SignIn(credentials)
        };
        self.issue(command)
    }

    fn cycle_auth_focus(&mut self) {
        let next = match (self.auth_mode, self.auth_focus) {
            (AuthMode::SignIn, AuthFocus::Email) => AuthFocus::Password,
            (AuthMode::SignIn, _) => AuthFocus::Email,
            (AuthMode::SignUp, AuthFocus::Email) => AuthFocus::Name,
            (AuthMode::SignUp, AuthFocus::Name) => AuthFocus::Password,
            (AuthMode::SignUp, AuthFocus::Password) => AuthFocus::Email,
        };
        self.focus_auth(next);
    }

    fn toggle_auth_mode(&mut self) {
        self.auth_mode = match self.auth_mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.error = None;
        if self.auth_mode == AuthMode::SignIn && self.auth_focus == AuthFocus::Name {
            self.focus_auth(AuthFocus::Email);
        }
    }

    fn focus_auth(&mut self, focus: AuthFocus) {
        self.auth_focus = focus;
        self.email.set_focused(focus == AuthFocus::Email);
        self.name.set_focused(focus == AuthFocus::Name);
        self.password.set_focused(focus == AuthFocus::Password);
    }

    fn focused_auth_field(&mut self) -> &mut Field {
        match self.auth_focus {
            AuthFocus::Email => &mut self.email,
            AuthFocus::Name => &mut self.name,
            AuthFocus::Password => &mut self.password,
        }
    }

    fn menu_key(&mut self, key: KeyEvent) -> Option<Request> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = self.menu_index.checked_sub(1).unwrap_or(MENU_ITEMS.len() - 1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_index = (self.menu_index + 1) % MENU_ITEMS.len();
                None
            }
            KeyCode::Enter => match self.menu_index {
                MENU_CREATE => {
                    self.open_create_issue();
                    None
                }
                MENU_LIST => self.issue(Command::ListIssues),
                _ => None,
            },
            _ => None,
        }
    }

    fn open_create_issue(&mut self) {
        self.title.clear();
        self.description.clear();
        self.set_view(View::CreateIssue);
        self.focus_issue(IssueFocus::Title);
    }

    fn create_key(&mut self, key: KeyEvent) -> Option<Request> {
        match key.code {
            KeyCode::Esc => {
                self.set_view(View::Menu);
                None
            }
            KeyCode::Tab => {
                let next = match self.issue_focus {
                    IssueFocus::Title => IssueFocus::Description,
                    IssueFocus::Description => IssueFocus::Title,
                };
                self.focus_issue(next);
                None
            }
            KeyCode::Enter => self.submit_issue(),
            _ => {
                match self.issue_focus {
                    IssueFocus::Title => self.title.input(key),
                    IssueFocus::Description => self.description.input(key),
                };
                None
            }
        }
    }

    fn submit_issue(&mut self) -> Option<Request> {
        let title = self.title.value().trim().to_string();
        let description = self.description.value().trim().to_string();
        if title.is_empty() {
            self.error = Some("Title is required".into());
            return None;
        }
        let owner = self
            .session
            .as_ref()
            .map(|s| s.user_id.clone())
            .unwrap_or_default();
        match NewIssue::new(title, owner) {
            Ok(issue) => {
                self.error = None;
                self.issue(Command::CreateIssue(issue.description(description)))
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    fn focus_issue(&mut self, focus: IssueFocus) {
        self.issue_focus = focus;
        self.title.set_focused(focus == IssueFocus::Title);
        self.description.set_focused(focus == IssueFocus::Description);
    }

    fn list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.set_view(View::Menu),
            KeyCode::Up | KeyCode::Char('k') => self.list_scroll = self.list_scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                let max = u16::try_from(self.issues.len().saturating_sub(1)).unwrap_or(u16::MAX);
                self.list_scroll = self.list_scroll.saturating_add(1).min(max);
            }
            _ => {}
        }
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.set_view(View::Message);
    }

    fn set_view(&mut self, view: View) {
        if view != self.view {
            tracing::debug!(from = ?self.view, to = ?view, "view change");
            self.epoch += 1;
            self.pending = false;
            self.error = None;
        }
        self.view = view;
    }

    /// Tag `command` with a fresh epoch. Refused while another request is
    /// outstanding.
    fn issue(&mut self, command: Command) -> Option<Request> {
        if self.pending {
            tracing::debug!(command = command.name(), "request already in flight");
            return None;
        }
        self.epoch += 1;
        self.pending = true;
        self.spinner_frame = 0;
        tracing::info!(epoch = self.epoch, command = command.name(), "issuing request");
        Some(Request {
            epoch: self.epoch,
            command,
        })
    }
}

// Read-only accessors for rendering.
impl<S> App<S> {
    pub fn view(&self) -> View {
        self.view
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn auth_fields(&self) -> (&Field, &Field, &Field) {
        (&self.email, &self.password, &self.name)
    }

    pub fn menu_index(&self) -> usize {
        self.menu_index
    }

    pub fn issue_fields(&self) -> (&Field, &Field) {
        (&self.title, &self.description)
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn list_scroll(&self) -> u16 {
        self.list_scroll
    }
}
