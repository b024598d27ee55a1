//! Staff authentication: password hashing, sessions, and the request gate.

pub mod gate;
pub mod password;
pub mod session;

pub use gate::{authenticate, authorize, is_public_path, require_session, Access, ACCESS_DENIED, INVALID_LOGIN};
pub use session::{Principal, SessionSettings, SessionUser, SESSION_COOKIE, SESSION_USER_KEY};
