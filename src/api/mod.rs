//! JSON-over-HTTP adapter for the task board.

mod server;

pub use server::{
    ApiError, ApiServer, PageParams, PurgeResponse, ReorderRequest, StatusUpdate, build_router,
    serve, start_server,
};
