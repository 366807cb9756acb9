//! Terminal rendering of the route table and resolved views.

use console::style;

use super::icons::{CROSS, ROUTE};
use crate::router::RouteTable;
use crate::router::dashboard::View;

pub fn format_routes(table: &RouteTable<View>) -> String {
    let width = table.routes().iter().map(|r| r.path.len()).max().unwrap_or(0);
    table
        .routes()
        .iter()
        .map(|route| format!("{:<width$}  {}\n", route.path, style(&route.title).dim()))
        .collect()
}

/// Breadcrumb trail (`Dashboard › Proyectos`), then title and description.
pub fn format_view(path: &str, view: View, prefix: &str) -> String {
    let trail = view
        .breadcrumbs(prefix)
        .iter()
        .map(|crumb| crumb.title)
        .collect::<Vec<_>>()
        .join(" › ");
    let icon = if view == View::NotFound { &CROSS } else { &ROUTE };
    format!(
        "{}{}\n{}\n{}  {}\n",
        icon,
        style(path).bold(),
        style(trail).dim(),
        style(view.title()).bold(),
        view.description()
    )
}
