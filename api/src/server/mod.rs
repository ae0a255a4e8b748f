pub mod runtime;

pub use runtime::{create_router, serve_with_shutdown, shutdown_signal, start_server};
