//! # punchclock-shared
//!
//! Types shared by every punchclock crate: the dirty-tracking entity model,
//! its JSON wire format, timestamp and duration formatting, and protocol
//! constants.

pub mod constants;
pub mod error;
pub mod model;
pub mod time;

pub use error::{ModelError, Result};
pub use model::{
    BaseModel, Client, Model, ModelKind, Project, Tag, Task, TimeEntry, User, Workspace,
};
