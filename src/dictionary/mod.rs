//! Word dictionary protocol
//!
//! A line-oriented command protocol served over the same listener as HTTP:
//! `GET <word>`, `SET <word> <desc>`, `CLEAR` and `ALL`. The dictionary lives
//! in a [`DictionaryStore`] owned by the server and shared by every session.

pub mod command;
pub mod session;
pub mod store;

pub use command::{Command, CommandError, Reply};
pub use session::Session;
pub use store::DictionaryStore;
