pub mod board;
pub mod icons;
pub mod routes;

pub use board::{format_board, format_connection, format_move_outcome};
pub use routes::{format_routes, format_view};
