// Terminal runtime: owns the screen, runs the event loop and starts one
// worker thread per request.
//
// Key presses and worker completions are applied to `App` from this thread
// only. Workers get a clone of the client and send exactly one `Completion`
// back over the channel.

pub mod render;

use std::io::stdout;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;

use crate::api::RemoteService;
use crate::app::{App, Completion, Outcome, Request};
use crate::error::Category;

/// How long to wait for a key before advancing the spinner.
const TICK: Duration = Duration::from_millis(100);

/// Held while the screen is in raw mode. Dropping it puts the terminal back,
/// whichever way `run` exits.
struct ScreenGuard;

impl ScreenGuard {
    fn acquire() -> Result<Self> {
        enable_raw_mode()?;
        // From here on a failed step is undone by the guard's drop.
        let guard = ScreenGuard;
        execute!(stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, Show);
    }
}

/// Take over the terminal and run `app` until the user quits.
pub fn run<S: RemoteService>(mut app: App<S>) -> Result<()> {
    let _screen = ScreenGuard::acquire()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let (tx, rx) = mpsc::channel();
    tracing::info!("ui started");
    let result = event_loop(&mut terminal, &mut app, &tx, &rx);
    tracing::info!(ok = result.is_ok(), "ui stopped");
    result
}

fn event_loop<B, S>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    tx: &Sender<Completion>,
    rx: &Receiver<Completion>,
) -> Result<()>
where
    B: Backend,
    S: RemoteService,
{
    loop {
        terminal.draw(|frame| render::draw(frame, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(request) = app.handle_key(key) {
                        dispatch(app, request, tx);
                    }
                }
            }
        } else {
            app.tick();
        }

        while let Ok(done) = rx.try_recv() {
            app.complete(done);
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}

/// Run `request` on a fresh thread. If the thread cannot be started the
/// failure is fed straight back so the view does not wait forever.
fn dispatch<S: RemoteService>(app: &mut App<S>, request: Request, tx: &Sender<Completion>) {
    let epoch = request.epoch;
    let mut service = app.service().clone();
    let tx = tx.clone();
    let spawned = thread::Builder::new()
        .name(format!("request-{epoch}"))
        .spawn(move || {
            let done = request.run(&mut service);
            if tx.send(done).is_err() {
                tracing::debug!(epoch, "ui gone before result arrived");
            }
        });

    if let Err(err) = spawned {
        tracing::error!(error = %err, "failed to start worker");
        app.complete(Completion {
            epoch,
            outcome: Outcome::Failed {
                category: Category::Transport,
                message: format!("could not start request: {err}"),
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Session;
    use crate::app::{Command, View};
    use crate::records::fake::FakeService;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn dispatched_request_reports_back_once() {
        let session = Session {
            user_id: "uid-a".into(),
            access_token: "t".into(),
        };
        let mut app = App::new(FakeService::default(), Some(session));
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        let request = app
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert_eq!(request.command, Command::ListIssues);

        let (tx, rx) = mpsc::channel();
        dispatch(&mut app, request, &tx);
        drop(tx);

        let done = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        app.complete(done);
        assert_eq!(app.view(), View::ListIssues);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
