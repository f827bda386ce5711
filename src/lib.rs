//! Root crate facade for the LiveEdit server and core library.

pub use liveedit_core::{actions, invalidate, persist, session, slots, EditSession, SlotEditor};
pub use liveedit_server::{
    config, create_app, error, handlers, models, resolve_bind_address, serve_router, AppError,
    AppState, Config,
};
