pub mod handlers;
pub mod history;
pub mod memory;
pub mod predict;
pub mod respond;
pub mod router;
pub mod users;

pub use router::http_router;
