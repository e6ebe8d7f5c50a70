pub mod backend;
pub mod error;
pub mod poll_fetch;
pub mod retry;
pub mod scope;
pub mod simple_get;
pub mod transport;
