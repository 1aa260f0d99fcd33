//! Page access guard
//!
//! Signed-out visitors are sent to the login page; signed-in visitors on the
//! login page are sent to the overview.

pub const LOGIN_PAGE: &str = "login.html";
pub const INDEX_PAGE: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Index,
}

impl Redirect {
    pub fn target(&self) -> &'static str {
        match self {
            Redirect::Login => LOGIN_PAGE,
            Redirect::Index => INDEX_PAGE,
        }
    }
}

/// Where to send the visitor, if anywhere. `location` is the full URL or path.
pub fn guard(has_session: bool, location: &str) -> Option<Redirect> {
    let on_login = location.contains(LOGIN_PAGE);
    match (has_session, on_login) {
        (false, false) => Some(Redirect::Login),
        (true, true) => Some(Redirect::Index),
        _ => None,
    }
}
