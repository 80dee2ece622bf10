pub mod config;

pub use config::ConfigError;
pub use nshub_error::{
    bail, ErrorExt, GenericError, HubResult, LogLevel, NamespaceError, ResultExt,
    StackError, StatusCode,
};
