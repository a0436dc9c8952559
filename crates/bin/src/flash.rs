//! One-shot messages carried across a redirect.
//!
//! Only the message's short code travels in the (signed) cookie; the text is
//! looked up here, so nothing user-controlled is ever reflected from a cookie.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Danger,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Danger => "danger",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    FillBoth,
    UsernameTaken,
    Registered,
    EnterBoth,
    InvalidLogin,
    LoginFirst,
    SessionExpired,
    InvalidCurrency,
    NotANumber,
    LoggedOut,
    ServerError,
}

impl Flash {
    const ALL: [Flash; 11] = [
        Flash::FillBoth,
        Flash::UsernameTaken,
        Flash::Registered,
        Flash::EnterBoth,
        Flash::InvalidLogin,
        Flash::LoginFirst,
        Flash::SessionExpired,
        Flash::InvalidCurrency,
        Flash::NotANumber,
        Flash::LoggedOut,
        Flash::ServerError,
    ];

    /// Cookie-safe identifier
    pub fn code(self) -> &'static str {
        match self {
            Flash::FillBoth => "fill-both",
            Flash::UsernameTaken => "username-taken",
            Flash::Registered => "registered",
            Flash::EnterBoth => "enter-both",
            Flash::InvalidLogin => "invalid-login",
            Flash::LoginFirst => "login-first",
            Flash::SessionExpired => "session-expired",
            Flash::InvalidCurrency => "invalid-currency",
            Flash::NotANumber => "not-a-number",
            Flash::LoggedOut => "logged-out",
            Flash::ServerError => "server-error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Flash::Registered => Level::Success,
            Flash::LoggedOut => Level::Info,
            Flash::FillBoth
            | Flash::EnterBoth
            | Flash::LoginFirst
            | Flash::SessionExpired
            | Flash::NotANumber => Level::Warning,
            Flash::UsernameTaken
            | Flash::InvalidLogin
            | Flash::InvalidCurrency
            | Flash::ServerError => Level::Danger,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::FillBoth => "Please fill both username and password.",
            Flash::UsernameTaken => "Username already exists. Choose another.",
            Flash::Registered => "Successfully registered! Please login.",
            Flash::EnterBoth => "Please enter both username and password.",
            Flash::InvalidLogin => "Invalid username or password.",
            Flash::LoginFirst => "Please login first.",
            Flash::SessionExpired => "Your session has expired. Please login again.",
            Flash::InvalidCurrency => "Invalid currency selected.",
            Flash::NotANumber => "Amount must be a number.",
            Flash::LoggedOut => "Logged out.",
            Flash::ServerError => "Something went wrong. Please try again.",
        }
    }
}

impl FromStr for Flash {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flash::ALL.into_iter().find(|f| f.code() == s).ok_or(())
    }
}
