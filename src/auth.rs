use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::{time::Duration, Key, SameSite};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};
use tracing::warn;

/// Session key marking a verified admin
const TERMINAL_ACCESS: &str = "terminal_access";
const SESSION_COOKIE: &str = "school_session";

/// Admin credential check. The configured password is kept only as a digest.
#[derive(Clone)]
pub struct AdminAuth {
    digest: Option<[u8; 32]>,
}

impl AdminAuth {
    /// Without a password the terminal cannot be unlocked
    pub fn new(password: Option<&str>) -> Self {
        let digest = password
            .filter(|p| !p.is_empty())
            .map(|p| Sha256::digest(p.as_bytes()).into());
        if digest.is_none() {
            warn!("no admin password configured, terminal is disabled");
        }
        AdminAuth { digest }
    }

    pub fn is_enabled(&self) -> bool {
        self.digest.is_some()
    }

    pub fn verify(&self, candidate: &str) -> bool {
        let Some(expected) = self.digest else {
            return false;
        };
        let actual: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        // compare every byte regardless of where the first difference is
        expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Marks the session as an admin session, rotating its id
pub fn grant_terminal_access(session: &Session) -> Result<(), actix_session::SessionInsertError> {
    session.renew();
    session.insert(TERMINAL_ACCESS, true)
}

pub fn has_terminal_access(session: &Session) -> bool {
    session
        .get::<bool>(TERMINAL_ACCESS)
        .ok()
        .flatten()
        .unwrap_or(false)
}

pub fn revoke_terminal_access(session: &Session) {
    session.purge();
}

/// Signing key for session cookies. A configured secret gives a stable key
/// across restarts; otherwise sessions end with the process.
pub fn session_key(secret: Option<&str>) -> Key {
    match secret.filter(|s| !s.is_empty()) {
        Some(secret) => Key::from(&Sha512::digest(secret.as_bytes())),
        None => {
            let mut bytes = [0u8; 64];
            rand::thread_rng().fill_bytes(&mut bytes);
            Key::from(&bytes)
        }
    }
}

/// Signed cookie sessions lasting one hour
pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_http_only(true)
        .cookie_secure(false)
        .cookie_same_site(SameSite::Strict)
        .cookie_content_security(CookieContentSecurity::Signed)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::hours(1)))
        .build()
}
