pub mod controller;
pub mod dispatcher;
pub mod source;

pub use controller::{listen, listen_reader, listen_stdin, ExecutionController, ListenSummary};
pub use dispatcher::{Dispatcher, DispatcherRef, Outcome};
pub use source::{LineSource, ReaderLines};
