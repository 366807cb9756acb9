//! The dashboard's route table and views. Section paths hang off the
//! router prefix (`/dashboard` unless configured otherwise).

use serde::Serialize;

use super::{DEFAULT_PREFIX, RouteDef, RouteTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Home,
    Projects,
    Tasks,
    Team,
    Users,
    Icons,
    Kanban,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// `prefix` + `/segment`; the empty segment is the prefix itself.
fn under(prefix: &str, segment: &str) -> String {
    let root = prefix.trim_end_matches('/');
    match (root.is_empty(), segment.is_empty()) {
        (true, true) => "/".to_string(),
        (_, true) => root.to_string(),
        _ => format!("{root}/{segment}"),
    }
}

impl View {
    pub const ROUTED: [View; 7] = [
        View::Home,
        View::Projects,
        View::Tasks,
        View::Team,
        View::Users,
        View::Icons,
        View::Kanban,
    ];

    /// Path segment below the router prefix; `None` for the not-found view.
    pub fn segment(&self) -> Option<&'static str> {
        match self {
            View::Home => Some(""),
            View::Projects => Some("projects"),
            View::Tasks => Some("tasks"),
            View::Team => Some("team"),
            View::Users => Some("users"),
            View::Icons => Some("icons"),
            View::Kanban => Some("kanban"),
            View::NotFound => None,
        }
    }

    /// Route path under `prefix`; `None` for the not-found view.
    pub fn path(&self, prefix: &str) -> Option<String> {
        self.segment().map(|segment| under(prefix, segment))
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Home => "Dashboard",
            View::Projects => "Proyectos",
            View::Tasks => "Tareas",
            View::Team => "Equipo",
            View::Users => "Usuarios",
            View::Icons => "Iconos",
            View::Kanban => "Kanban",
            View::NotFound => "No encontrado",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            View::Home => "Proyectos activos, tareas pendientes y equipo.",
            View::Projects => "Gestión de proyectos.",
            View::Tasks => "Gestión de tareas.",
            View::Team => "Gestión de equipo.",
            View::Users => "Gestión de usuarios.",
            View::Icons => "Catálogo de iconos.",
            View::Kanban => "Tablero del sprint activo.",
            View::NotFound => "La ruta solicitada no existe.",
        }
    }

    /// `Dashboard` links back to the root; the section itself is not a link.
    pub fn breadcrumbs(&self, prefix: &str) -> Vec<Breadcrumb> {
        let root = Breadcrumb {
            title: View::Home.title(),
            href: View::Home.path(prefix),
        };
        match self {
            View::Home => vec![root],
            other => vec![
                root,
                Breadcrumb {
                    title: other.title(),
                    href: None,
                },
            ],
        }
    }
}

/// The dashboard table under the default `/dashboard` prefix.
pub fn dashboard_routes() -> RouteTable<View> {
    routes_under(DEFAULT_PREFIX)
}

pub fn routes_under(prefix: &str) -> RouteTable<View> {
    let routes = View::ROUTED
        .iter()
        .filter_map(|view| view.path(prefix).map(|path| RouteDef::new(path, view.title(), *view)))
        .collect();
    RouteTable::new(routes, View::NotFound)
}
