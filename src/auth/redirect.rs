//! Forced-logout hook for the view layer

/// Called once the session has been torn down after a rejected refresh.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, route: &str);
}

/// Terminal front end: there is no page to navigate, so tell the user to log in again.
#[derive(Debug, Default)]
pub struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect_to_login(&self, route: &str) {
        tracing::warn!(route, "Session expired, credentials cleared");
        eprintln!("Session expired. Run 'erp-cli login' to sign in again.");
    }
}
