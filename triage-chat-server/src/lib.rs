pub mod handlers;
pub mod server;
pub mod state;

pub use server::{router, run_server};
pub use state::{AppState, SymptomRequest};
