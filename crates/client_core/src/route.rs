//! Recovery of the active audit board from the current location.
//!
//! The server does not know which board a given client session acts for, so
//! the index is read back out of the `/county/board/{index}` route after each
//! dashboard merge. Everything that depends on this goes through
//! [`BoardRouteLocator`] so the lookup can be swapped for an explicit session
//! value.

const BOARD_ROUTE_PREFIX: &str = "/county/board/";

pub trait BoardRouteLocator: Send + Sync {
    /// Path of the current location, if there is one.
    fn current_path(&self) -> Option<String>;

    fn audit_board_index(&self) -> Option<usize> {
        self.current_path()
            .as_deref()
            .and_then(parse_board_route)
    }
}

/// Parses `/county/board/{digits}`. Trailing segments, query strings and
/// fragments after the index are ignored.
pub fn parse_board_route(path: &str) -> Option<usize> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let rest = path.strip_prefix(BOARD_ROUTE_PREFIX)?;
    let segment = rest.split('/').next().unwrap_or_default();
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Locator for sessions without a location (CLI, background jobs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRoute;

impl BoardRouteLocator for NoRoute {
    fn current_path(&self) -> Option<String> {
        None
    }
}

/// Locator over a path the owner sets on navigation.
#[derive(Debug, Default, Clone)]
pub struct StaticRoute {
    path: Option<String>,
}

impl StaticRoute {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn navigate(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }
}

impl BoardRouteLocator for StaticRoute {
    fn current_path(&self) -> Option<String> {
        self.path.clone()
    }
}
