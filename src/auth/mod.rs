//! Authentication and session state
//!
//! Password login against the backend's JWT endpoints, the session store
//! abstraction that holds the resulting tokens, and the hook used to send
//! the user back to login when a session cannot be renewed.

pub mod claims;
pub mod login;
pub mod redirect;
pub mod register;
pub mod tokens;

pub use login::{login, logout, status};
pub use redirect::{LoginRedirect, TerminalRedirect};
pub use register::{create_employee, register, NewEmployee, Registration};
pub use tokens::{CredentialPair, SessionStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_ROLE_KEY};

#[cfg(test)]
pub use tokens::MemorySessionStore;
