//! Client core for the WorkflowS project dashboard: an in-page view router,
//! a reconnecting realtime channel for task events, and a Kanban board that
//! reconciles optimistic moves with the REST API.

pub mod api;
pub mod board;
pub mod config;
pub mod errors;
pub mod logging;
pub mod realtime;
pub mod router;
pub mod ui;
