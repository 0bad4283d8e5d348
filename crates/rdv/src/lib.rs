//! rdv - Local developer-environment credential manager
//!
//! Named profiles for AWS, PostgreSQL, MySQL, Redis, GitHub and Google
//! Cloud are kept in their usual files and composed into environment
//! variables: printed, merged into a dotenv file, or injected into a
//! child process.

pub mod cli;
pub mod compose;
pub mod kind;
pub mod plugin;
pub mod providers;
pub mod store;

pub use compose::{Composer, Selector};
pub use plugin::{Context, Provider, Registry, RegistryError};
