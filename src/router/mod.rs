//! In-page view router for the dashboard.
//!
//! The router owns every link under its prefix (`/dashboard` by default).
//! Plain left clicks on those links are turned into history pushes instead
//! of full page loads; back/forward re-resolve the view from the host
//! location.
//!
//! ## Matching
//!
//! | Input                      | Table                                    | Result               |
//! |----------------------------|------------------------------------------|----------------------|
//! | `/dashboard/projects`      | `/dashboard`, `/dashboard/projects`      | `/dashboard/projects` (exact) |
//! | `/dashboard/projects/42`   | `/dashboard`, `/dashboard/projects`      | `/dashboard/projects` (longest prefix) |
//! | `/dashboard/unknown`       | `/dashboard`, `/dashboard/projects`      | `/dashboard` (prefix) |
//! | `/dashboardx`              | `/dashboard`                             | not found            |
//!
//! ## Lifetime
//!
//! `ViewRouter::mount` registers one click listener and one popstate
//! listener on the host; dropping the router removes both.

pub mod click;
pub mod dashboard;
pub mod host;

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use reqwest::Url;
use tokio::sync::watch;

use crate::errors::RouteError;

pub use click::{ClickEvent, Element};
pub use host::{BrowserHost, ListenerId, MemoryHost};

pub const DEFAULT_PREFIX: &str = "/dashboard";

// ── Route table ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef<V> {
    pub path: String,
    pub title: String,
    pub view: V,
}

impl<V> RouteDef<V> {
    pub fn new(path: impl Into<String>, title: impl Into<String>, view: V) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            view,
        }
    }
}

/// Resolve `path` against `routes`.
///
/// An exact match wins. Otherwise the longest route whose path followed by
/// `/` prefixes the input is chosen; equal lengths keep table order.
pub fn match_route<'a, V>(path: &str, routes: &'a [RouteDef<V>]) -> Option<&'a RouteDef<V>> {
    if let Some(exact) = routes.iter().find(|r| r.path == path) {
        return Some(exact);
    }

    let mut best: Option<&RouteDef<V>> = None;
    for route in routes {
        let is_prefix = path
            .strip_prefix(route.path.as_str())
            .is_some_and(|rest| rest.starts_with('/'));
        if is_prefix && best.is_none_or(|b| route.path.len() > b.path.len()) {
            best = Some(route);
        }
    }
    best
}

/// Ordered routes plus the view shown when nothing matches.
#[derive(Debug, Clone)]
pub struct RouteTable<V> {
    routes: Vec<RouteDef<V>>,
    not_found: V,
}

impl<V> RouteTable<V> {
    pub fn new(routes: Vec<RouteDef<V>>, not_found: V) -> Self {
        Self { routes, not_found }
    }

    pub fn routes(&self) -> &[RouteDef<V>] {
        &self.routes
    }

    pub fn not_found(&self) -> &V {
        &self.not_found
    }

    pub fn match_path(&self, path: &str) -> Option<&RouteDef<V>> {
        match_route(path, &self.routes)
    }

    /// The view for `path`, falling back to the not-found view.
    pub fn resolve(&self, path: &str) -> &V {
        self.match_path(path)
            .map(|r| &r.view)
            .unwrap_or(&self.not_found)
    }

    /// Check that paths are unique, well formed and (when a prefix is
    /// given) owned by the router.
    pub fn validate(&self, prefix: Option<&str>) -> Result<(), RouteError> {
        let mut seen = HashSet::new();
        for route in &self.routes {
            let path = route.path.as_str();
            if !path.starts_with('/') || (path.len() > 1 && path.ends_with('/')) {
                return Err(RouteError::Malformed(path.to_string()));
            }
            if let Some(prefix) = prefix
                && path != prefix
                && !path.starts_with(&format!("{}/", prefix.trim_end_matches('/')))
            {
                return Err(RouteError::OutsidePrefix {
                    path: path.to_string(),
                    prefix: prefix.to_string(),
                });
            }
            if !seen.insert(path) {
                return Err(RouteError::Duplicate(path.to_string()));
            }
        }
        Ok(())
    }
}

// ── Router ───────────────────────────────────────────────────────────

/// What `intercept_click` did with a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Left to the host's default handling.
    Ignored,
    /// Default prevented; `navigated` is false when the link pointed at the
    /// current path.
    Prevented { navigated: bool },
}

struct RouterInner<V> {
    host: Arc<dyn BrowserHost>,
    table: RouteTable<V>,
    prefix: String,
    current: watch::Sender<String>,
}

impl<V> RouterInner<V> {
    fn intercept_click(&self, event: &mut ClickEvent) -> ClickOutcome {
        let Some(anchor) = event.closest_anchor(|href| href.starts_with(&self.prefix)) else {
            return ClickOutcome::Ignored;
        };
        if event.default_prevented || event.button != 0 || event.has_modifier() {
            return ClickOutcome::Ignored;
        }
        if anchor
            .target
            .as_deref()
            .is_some_and(|t| !t.is_empty() && t != "_self")
        {
            return ClickOutcome::Ignored;
        }

        let Some(href) = anchor.href.as_deref() else {
            return ClickOutcome::Ignored;
        };
        let Ok(origin) = Url::parse(&self.host.origin()) else {
            tracing::debug!(origin = %self.host.origin(), "Host origin is not a URL; leaving click alone");
            return ClickOutcome::Ignored;
        };
        let Ok(resolved) = origin.join(href) else {
            return ClickOutcome::Ignored;
        };
        if resolved.origin() != origin.origin() {
            return ClickOutcome::Ignored;
        }

        event.prevent_default();
        let navigated = self.navigate(resolved.path());
        ClickOutcome::Prevented { navigated }
    }

    fn navigate(&self, path: &str) -> bool {
        if path == self.host.current_path() {
            return false;
        }
        self.host.push_state(path);
        self.current.send_replace(path.to_string());
        tracing::debug!(path, "Navigated");
        true
    }

    fn on_pop_state(&self) -> bool {
        let path = self.host.current_path();
        self.current.send_if_modified(|current| {
            if *current == path {
                return false;
            }
            *current = path;
            true
        })
    }
}

/// Mounted router. Holds its host listeners until dropped.
pub struct ViewRouter<V: Send + Sync + 'static> {
    inner: Arc<RouterInner<V>>,
    listeners: Vec<ListenerId>,
}

impl<V: Send + Sync + 'static> ViewRouter<V> {
    /// Read the host's current path and start listening for clicks and
    /// history traversal.
    pub fn mount(host: Arc<dyn BrowserHost>, table: RouteTable<V>, prefix: impl Into<String>) -> Self {
        let (current, _) = watch::channel(host.current_path());
        let inner = Arc::new(RouterInner {
            host: Arc::clone(&host),
            table,
            prefix: prefix.into(),
            current,
        });

        let weak: Weak<RouterInner<V>> = Arc::downgrade(&inner);
        let click = host.add_click_listener(Arc::new(move |event: &mut ClickEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.intercept_click(event);
            }
        }));
        let weak: Weak<RouterInner<V>> = Arc::downgrade(&inner);
        let popstate = host.add_popstate_listener(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_pop_state();
            }
        }));

        tracing::debug!(path = %inner.current.borrow().as_str(), "Router mounted");
        Self {
            inner,
            listeners: vec![click, popstate],
        }
    }

    pub fn current_path(&self) -> String {
        self.inner.current.borrow().clone()
    }

    /// Receiver that changes whenever the current path does.
    pub fn watch_path(&self) -> watch::Receiver<String> {
        self.inner.current.subscribe()
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn table(&self) -> &RouteTable<V> {
        &self.inner.table
    }

    pub fn intercept_click(&self, event: &mut ClickEvent) -> ClickOutcome {
        self.inner.intercept_click(event)
    }

    /// Push `path` unless it is already the host's current path.
    pub fn navigate(&self, path: &str) -> bool {
        self.inner.navigate(path)
    }

    pub fn on_pop_state(&self) -> bool {
        self.inner.on_pop_state()
    }

    pub fn current_route(&self) -> Option<&RouteDef<V>> {
        let path = self.current_path();
        self.inner.table.match_path(&path)
    }

    /// The matched view, or the not-found view.
    pub fn render(&self) -> &V {
        let path = self.current_path();
        self.inner.table.resolve(&path)
    }
}

impl<V: Send + Sync + 'static> Drop for ViewRouter<V> {
    fn drop(&mut self) {
        for id in self.listeners.drain(..) {
            self.inner.host.remove_listener(id);
        }
    }
}
