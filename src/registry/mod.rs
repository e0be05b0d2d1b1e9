//! # Registry
//!
//! Command compilation, the command registry and the help commands it
//! installs.
//!
//! ```text
//! Registry
//! ├── Command          (compiled phrase, description, handler chain)
//! ├── CommandRegistry  (dispatch order + keyword groups, help side effects)
//! └── help             (keyword and global help handlers)
//! ```

pub mod command;
pub mod command_registry;
pub mod handler;
pub mod help;

pub use command::{token_count, Command, WILDCARD_TOKEN};
pub use command_registry::{CommandRegistry, HELP_KEYWORD};
pub use handler::{handler, Handler, HandlerRef};
pub use help::{render_listing, GLOBAL_HELP_BANNER};
