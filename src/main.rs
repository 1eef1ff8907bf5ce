// Entrypoint for the issue client.
// - Configuration and the initial sign-in happen here with plain prompts;
//   any failure exits non-zero before the screen is taken over.
// - The full-screen UI then runs until the user quits.

use anyhow::Context;
use zello_cli::{api::ApiClient, app::App, config::Config, logging, prompt, tui};

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::load().context("Error loading configuration")?;
    let mut api = ApiClient::new(&config).context("Error creating Supabase client")?;

    let session = prompt::authenticate(&mut api)?;

    // Blocks until the user quits.
    tui::run(App::new(api, session))?;
    Ok(())
}
