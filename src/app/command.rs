// Background work requested by the state machine and the results it gets
// back. Both sides are closed enums so every view dispatch is exhaustive.

use crate::api::{Credentials, RemoteService, Session};
use crate::auth;
use crate::error::Category;
use crate::records::{self, Issue, NewIssue};

/// One network operation, run off the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignIn(Credentials),
    SignUp { credentials: Credentials, name: String },
    CreateIssue(NewIssue),
    ListIssues,
}

/// What a finished command reports back into the event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Failed { category: Category, message: String },
    Authenticated { session: Session, greeting: String },
    IssueCreated(Issue),
    IssuesLoaded(Vec<Issue>),
}

/// A command tagged with the epoch it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub epoch: u64,
    pub command: Command,
}

/// The result of a `Request`, carrying the same epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub epoch: u64,
    pub outcome: Outcome,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SignIn(_) => "sign_in",
            Command::SignUp { .. } => "sign_up",
            Command::CreateIssue(_) => "create_issue",
            Command::ListIssues => "list_issues",
        }
    }

    /// Perform the call. Errors become `Outcome::Failed`; nothing here panics
    /// or retries.
    pub fn run<S: RemoteService>(self, service: &mut S) -> Outcome {
        let label = self.name();
        let result = match self {
            Command::SignIn(credentials) => {
                auth::sign_in(service, &credentials).map(|session| Outcome::Authenticated {
                    session,
                    greeting: "Signed in".into(),
                })
            }
            Command::SignUp { credentials, name } => auth::sign_up(service, &credentials, &name)
                .map(|(session, profile)| Outcome::Authenticated {
                    session,
                    greeting: format!("Account created. Welcome, {}!", profile.name),
                }),
            Command::CreateIssue(issue) => {
                records::create_issue(service, &issue).map(Outcome::IssueCreated)
            }
            Command::ListIssues => records::list_issues(service).map(Outcome::IssuesLoaded),
        };
        result.unwrap_or_else(|err| {
            tracing::warn!(command = label, error = %err, "command failed");
            Outcome::Failed {
                category: err.category(),
                message: err.to_string(),
            }
        })
    }
}

impl Request {
    pub fn run<S: RemoteService>(self, service: &mut S) -> Completion {
        let _span = tracing::info_span!("request", epoch = self.epoch, command = self.command.name())
            .entered();
        Completion {
            epoch: self.epoch,
            outcome: self.command.run(service),
        }
    }
}
