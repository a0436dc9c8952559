//! Signed session and flash cookies.

use sha2::{Digest, Sha512};
use time::Duration;
use tower_cookies::{Cookie, Cookies, Key, cookie::SameSite};

use crate::flash::Flash;

pub const SESSION_COOKIE: &str = "currex_session";
const FLASH_COOKIE: &str = "currex_flash";

/// Secret used when none is configured. Only fit for development.
pub const DEV_SECRET: &str = "dev-secret";

/// Derive the cookie signing key from the configured secret.
///
/// Any secret length is accepted; SHA-512 stretches it to the 64 bytes the
/// signing key needs.
pub fn derive_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Cookie settings shared by every handler.
#[derive(Clone)]
pub struct CookieSettings {
    pub key: Key,
    pub secure: bool,
    pub session_ttl: std::time::Duration,
}

impl CookieSettings {
    /// The session token from a correctly signed cookie, if present.
    pub fn session_token(&self, cookies: &Cookies) -> Option<String> {
        cookies
            .signed(&self.key)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    }

    pub fn set_session(&self, cookies: &Cookies, token: String) {
        let cookie = Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::seconds(
                i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX),
            ))
            .build();
        cookies.signed(&self.key).add(cookie);
    }

    pub fn clear_session(&self, cookies: &Cookies) {
        cookies
            .signed(&self.key)
            .remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    }

    /// Queue a message for the next page the browser loads.
    pub fn set_flash(&self, cookies: &Cookies, flash: Flash) {
        let cookie = Cookie::build((FLASH_COOKIE, flash.code()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        cookies.signed(&self.key).add(cookie);
    }

    /// Read and consume the pending message, if any.
    pub fn take_flash(&self, cookies: &Cookies) -> Option<Flash> {
        let signed = cookies.signed(&self.key);
        let cookie = signed.get(FLASH_COOKIE)?;
        signed.remove(Cookie::build((FLASH_COOKIE, "")).path("/").build());
        cookie.value().parse().ok()
    }
}
