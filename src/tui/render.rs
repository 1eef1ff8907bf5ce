// Drawing. Every function here reads `App` and writes to the frame; nothing
// mutates state, so the same state always renders the same screen.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, AuthMode, Notice, View, MENU_ITEMS};
use crate::error::Category;

const ACCENT: Color = Color::Indexed(212);
const ERROR: Color = Color::Indexed(204);
const MUTED: Color = Color::Indexed(246);
const CARD_WIDTH: u16 = 80;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw<S>(frame: &mut Frame, app: &App<S>) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let title = Span::styled(
        " Zello ",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    );
    frame.render_widget(Paragraph::new(Line::from(title)), header);

    let card = card_area(body);
    match app.view() {
        View::Auth => draw_auth(frame, card, app),
        View::Menu => draw_menu(frame, card, app),
        View::CreateIssue => draw_create(frame, card, app),
        View::ListIssues => draw_list(frame, card, app),
        View::Message => draw_message(frame, card, app),
    }

    frame.render_widget(
        Paragraph::new(Span::styled(help_text(app), Style::default().fg(MUTED))),
        footer,
    );
}

fn card_area(body: Rect) -> Rect {
    Rect {
        width: body.width.min(CARD_WIDTH),
        ..body
    }
}

fn card(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
}

fn help_text<S>(app: &App<S>) -> &'static str {
    match app.view() {
        View::Auth => "Enter submit • Tab switch field • Ctrl+S sign-in/sign-up • Esc quit",
        View::Menu => "↑/↓ move • Enter select • Q quit",
        View::CreateIssue => "Enter submit • Tab switch field • Esc back",
        View::ListIssues => "↑/↓ scroll • Esc back",
        View::Message => "Enter/Esc to continue",
    }
}

/// Spinner while a request is outstanding, otherwise the inline error, if any.
fn status_line<S>(app: &App<S>, busy: &str) -> Line<'static> {
    if app.is_pending() {
        let frame = SPINNER[app.spinner_frame() % SPINNER.len()];
        return Line::from(Span::styled(
            format!("{frame} {busy}"),
            Style::default().fg(ACCENT),
        ));
    }
    match app.error() {
        Some(err) => Line::from(Span::styled(err.to_string(), Style::default().fg(ERROR))),
        None => Line::default(),
    }
}

fn draw_auth<S>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let (email, password, name) = app.auth_fields();
    let signing_up = app.auth_mode() == AuthMode::SignUp;
    let block = card(if signing_up { "Sign Up" } else { "Sign In" });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let name_rows = if signing_up { 3 } else { 0 };
    let [email_area, name_area, password_area, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(name_rows),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(email.widget(), email_area);
    if signing_up {
        frame.render_widget(name.widget(), name_area);
    }
    frame.render_widget(password.widget(), password_area);

    let busy = if signing_up { "Creating account…" } else { "Signing in…" };
    frame.render_widget(Paragraph::new(status_line(app, busy)), status);
}

fn draw_menu<S>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let block = card("Menu");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [list_area, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    let items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .map(|(title, desc)| {
            ListItem::new(Text::from(vec![
                Line::from(Span::raw(*title)),
                Line::from(Span::styled(*desc, Style::default().fg(MUTED))),
            ]))
        })
        .collect();
    let list = List::new(items)
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .highlight_symbol("│ ");
    let mut state = ListState::default();
    state.select(Some(app.menu_index()));
    frame.render_stateful_widget(list, list_area, &mut state);

    let line = match (app.is_pending(), app.flash()) {
        (false, Some(flash)) => Line::from(Span::styled(flash.to_string(), Style::default().fg(ACCENT))),
        _ => status_line(app, "Loading issues…"),
    };
    frame.render_widget(Paragraph::new(line), status);
}

fn draw_create<S>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let (title, description) = app.issue_fields();
    let block = card("Create Issue");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [title_area, desc_area, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(title.widget(), title_area);
    frame.render_widget(description.widget(), desc_area);
    frame.render_widget(Paragraph::new(status_line(app, "Creating issue…")), status);
}

fn draw_list<S>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let issues = app.issues();
    let block = card("My Issues");

    if issues.is_empty() {
        frame.render_widget(Paragraph::new("No issues found.").block(block), area);
        return;
    }

    let lines: Vec<Line> = issues
        .iter()
        .map(|issue| {
            Line::from(vec![
                Span::styled(format!("#{:<4} ", issue.id), Style::default().fg(ACCENT)),
                Span::raw(format!("{:<20} ", issue.title)),
                Span::styled(format!("{:<8} ", issue.status), Style::default().fg(MUTED)),
                Span::raw(issue.description.clone()),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .scroll((app.list_scroll(), 0)),
        area,
    );
}

fn draw_message<S>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let error = Style::default().fg(ERROR);
    let (title, lines) = match app.notice() {
        Some(Notice::Error { category, message }) => {
            let mut lines = vec![Line::from(Span::styled(message.clone(), error))];
            if let Some(note) = failure_note(*category) {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(note, Style::default().fg(MUTED))));
            }
            (failure_title(*category), lines)
        }
        Some(Notice::Info(message)) => ("Info", vec![Line::from(message.clone())]),
        None => ("Info", Vec::new()),
    };
    frame.render_widget(
        Paragraph::new(lines)
            .block(card(title))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn failure_title(category: Category) -> &'static str {
    match category {
        Category::Transport => "Error",
        Category::EmptyResult => "Not confirmed",
        Category::NotFound => "Not found",
        Category::Invalid => "Invalid input",
    }
}

/// Extra guidance for failures whose outcome on the service is unknown.
fn failure_note(category: Category) -> Option<&'static str> {
    match category {
        Category::EmptyResult => Some("The issue may still have been saved. Check the list before retrying."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Session;
    use crate::app::{Command, Completion, Outcome};
    use crate::records::fake::FakeService;
    use crate::records::Issue;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;

    fn render(app: &App<FakeService>) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap().buffer.clone()
    }

    fn screen_text(buffer: &Buffer) -> String {
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn menu_app() -> App<FakeService> {
        App::new(
            FakeService::default(),
            Some(Session {
                user_id: "uid-a".into(),
                access_token: "t".into(),
            }),
        )
    }

    fn load(app: &mut App<FakeService>, issues: Vec<Issue>) {
        app.handle_key(key(KeyCode::Down));
        let request = app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(request.command, Command::ListIssues);
        app.complete(Completion {
            epoch: request.epoch,
            outcome: Outcome::IssuesLoaded(issues),
        });
    }

    #[test]
    fn rendering_is_a_pure_function_of_state() {
        let app = menu_app();
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        let first = terminal.draw(|f| draw(f, &app)).unwrap().buffer.clone();
        let second = terminal.draw(|f| draw(f, &app)).unwrap().buffer.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_issue_list_says_so() {
        let mut app = menu_app();
        load(&mut app, vec![]);
        assert_eq!(app.view(), View::ListIssues);
        assert_eq!(app.issues().len(), 0);
        assert!(screen_text(&render(&app)).contains("No issues found."));
    }

    #[test]
    fn issues_render_in_received_order() {
        let mut app = menu_app();
        let issue = |id: i64, title: &str| Issue {
            id,
            title: title.into(),
            description: String::new(),
            status: "open".into(),
            user_id: "uid-a".into(),
            created_at: "2024-05-01T12:00:00Z".parse().unwrap(),
        };
        load(&mut app, vec![issue(5, "Zebra bug"), issue(2, "Alpha bug")]);

        let text = screen_text(&render(&app));
        let zebra = text.find("Zebra bug").unwrap();
        let alpha = text.find("Alpha bug").unwrap();
        assert!(zebra < alpha);
    }

    #[test]
    fn auth_view_shows_mode_and_masks_password() {
        let mut app = App::new(FakeService::default(), None);
        assert!(screen_text(&render(&app)).contains("Sign In"));

        app.handle_key(key(KeyCode::Tab));
        for c in "hunter2".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));

        let text = screen_text(&render(&app));
        assert!(text.contains("Sign Up"));
        assert!(text.contains("Name"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn unconfirmed_create_warns_it_may_have_been_saved() {
        let service = FakeService::default();
        service.store.lock().unwrap().hide_inserts = true;
        let mut app = App::new(
            service,
            Some(Session {
                user_id: "uid-a".into(),
                access_token: "t".into(),
            }),
        );
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('t')));
        let request = app.handle_key(key(KeyCode::Enter)).unwrap();
        let done = request.run(&mut app.service().clone());
        app.complete(done);

        let text = screen_text(&render(&app));
        assert!(text.contains("Not confirmed"));
        assert!(text.contains("may still have been saved"));
    }

    #[test]
    fn transport_failure_has_no_saved_note() {
        let mut app = menu_app();
        app.handle_key(key(KeyCode::Down));
        let request = app.handle_key(key(KeyCode::Enter)).unwrap();
        app.complete(Completion {
            epoch: request.epoch,
            outcome: Outcome::Failed {
                category: Category::Transport,
                message: "network error: connection refused".into(),
            },
        });

        let text = screen_text(&render(&app));
        assert!(text.contains("Error"));
        assert!(text.contains("connection refused"));
        assert!(!text.contains("may still have been saved"));
    }

    #[test]
    fn validation_error_is_drawn_inline() {
        let mut app = menu_app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        let text = screen_text(&render(&app));
        assert!(text.contains("Create Issue"));
        assert!(text.contains("Title is required"));
    }
}
