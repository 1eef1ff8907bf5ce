// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive client.
//
// Module responsibilities:
// - `config`: process settings read once at startup.
// - `api`: blocking HTTP client for the hosted backend and the
//   `RemoteService` trait everything else is written against.
// - `records`: typed issue and user-profile operations (the access layer).
// - `auth`: sign-in and the sign-up chain.
// - `prompt`: line prompts that authenticate before the UI starts.
// - `app`: the view state machine.
// - `tui`: terminal session, event loop, workers and rendering.
// - `logging`: file-backed tracing setup.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod records;
pub mod tui;
