//! Service layer
//!
//! The dispatcher runs handlers and produces outcomes; the completion
//! reporter turns outcomes into broker acknowledgments. Both are shared by
//! every poller of a worker.

mod dispatcher;
mod reporter;

pub use dispatcher::Dispatcher;
pub use reporter::CompletionReporter;
