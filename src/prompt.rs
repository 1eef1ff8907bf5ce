// Line-prompt bootstrap that runs before the full-screen UI, using
// `dialoguer` for input and `indicatif` for a spinner while the network call
// is in flight. Every failure here is fatal to the process.

use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{Credentials, RemoteService, Session};
use crate::auth;

/// What the user picked at the first prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    SignIn,
    SignUp,
    /// Skip the prompts and use the sign-in screen inside the UI.
    Later,
}

pub fn parse_choice(raw: &str) -> Option<Choice> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "s" => Some(Choice::SignIn),
        "c" => Some(Choice::SignUp),
        "" => Some(Choice::Later),
        _ => None,
    }
}

/// Ask how to authenticate and do it. `None` means the user chose to sign in
/// from the UI instead.
pub fn authenticate<S: RemoteService>(service: &mut S) -> Result<Option<Session>> {
    let answer: String = Input::new()
        .with_prompt("Press S to sign in, C to create an account, or Enter to continue")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), &'static str> {
            parse_choice(input).map(|_| ()).ok_or("type S, C or nothing")
        })
        .interact_text()?;

    match parse_choice(&answer) {
        Some(Choice::SignIn) => sign_in(service).map(Some),
        Some(Choice::SignUp) => sign_up(service).map(Some),
        Some(Choice::Later) | None => Ok(None),
    }
}

fn sign_in<S: RemoteService>(service: &mut S) -> Result<Session> {
    let credentials = ask_credentials()?;
    let spinner = spinner("Signing in...")?;
    let result = auth::sign_in(service, &credentials);
    spinner.finish_and_clear();

    let session = result.context("Error signing in")?;
    println!("Successfully authenticated!");
    Ok(session)
}

fn sign_up<S: RemoteService>(service: &mut S) -> Result<Session> {
    let credentials = ask_credentials()?;
    let name: String = Input::new().with_prompt("Name").interact_text()?;

    let spinner = spinner("Creating account...")?;
    let result = auth::sign_up(service, &credentials, name.trim());
    spinner.finish_and_clear();

    let (session, profile) = result.context("Error creating account")?;
    println!("Account created successfully!");
    println!("User record created: ID={}, Name={}", profile.id, profile.name);
    Ok(session)
}

fn ask_credentials() -> Result<Credentials> {
    let email: String = Input::new().with_prompt("Email").interact_text()?;
    // `Password` hides input in the terminal.
    let password = Password::new().with_prompt("Password").interact()?;
    Ok(Credentials::new(email.trim(), password))
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}
