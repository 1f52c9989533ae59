//! Dashboard HTTP/WebSocket server.

mod api;
mod error;
mod handlers;
mod server;
mod state;

pub use api::{
    freshness, DeleteResponse, EntryType, FileEntry, FileListing, FilesQuery, Freshness,
    StatusResponse,
};
pub use error::{ApiError, ServerError};
pub use server::DashboardServer;
pub use state::AppState;
