//! Command implementations.
//!
//! Each command takes the shared [`Context`] and a writer for its output.
//! Notifications raised along the way are printed once the command is done,
//! followed by a notice if the backend rejected the stored session.

pub mod auth;
pub mod browse;
pub mod food;
pub mod orders;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use forkline_client::{
    ApiClient, ClientConfig, ClientError, CustomerView, FileStore, NotificationLog, Notifier,
    RestaurantView, RoleView, SessionController, TokenStore,
};
use forkline_core::Role;
use tracing::info;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Session and notification sink for one invocation.
pub struct Context {
    pub session: SessionController<ApiClient>,
    notes: NotificationLog,
}

impl Context {
    /// Open the session file and restore whatever session it holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be read or the HTTP client
    /// cannot be built.
    pub fn open(config: &ClientConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = FileStore::open(config.session_file.clone())?;
        let tokens = TokenStore::new(store);
        let api = ApiClient::new(config, tokens.clone())?;
        let mut session = SessionController::new(api, tokens);
        if let Some(user) = session.restore() {
            info!(user_id = %user.id, "Using stored session");
        }
        Ok(Self {
            session,
            notes: NotificationLog::new(),
        })
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::new(self.notes.clone())
    }

    /// The signed-in user's view, loaded.
    pub async fn view(&self) -> Result<RoleView<ApiClient>, ClientError> {
        let user = self.session.require_user()?.clone();
        let mut view = RoleView::for_user(self.session.api().clone(), self.notifier(), user);
        view.refresh().await?;
        Ok(view)
    }

    pub async fn customer(&self) -> Result<CustomerView<ApiClient>, ClientError> {
        let user = self.session.require_role(Role::Customer)?.clone();
        let mut view = CustomerView::new(self.session.api().clone(), self.notifier(), user)?;
        view.refresh().await?;
        Ok(view)
    }

    pub async fn restaurant(&self) -> Result<RestaurantView<ApiClient>, ClientError> {
        let user = self.session.require_role(Role::Restaurant)?.clone();
        let mut view = RestaurantView::new(self.session.api().clone(), self.notifier(), user)?;
        view.refresh().await?;
        Ok(view)
    }

    /// Print pending notifications and apply any forced logout.
    pub fn finish(&mut self, out: &mut impl Write) -> io::Result<()> {
        for note in self.notes.drain() {
            writeln!(out, "{note}")?;
        }
        if self.session.handle_auth_failures() {
            writeln!(out, "Your session has expired. Please sign in again.")?;
        }
        Ok(())
    }
}

/// Ask on the terminal; anything but `y`/`yes` declines.
pub fn ask(prompt: &str) -> bool {
    confirm_with(prompt, &mut io::stderr(), &mut io::stdin().lock())
}

fn confirm_with(prompt: &str, out: &mut impl Write, input: &mut impl BufRead) -> bool {
    if write!(out, "{prompt} [y/N] ").and_then(|()| out.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    input.read_line(&mut answer).is_ok()
        && matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
