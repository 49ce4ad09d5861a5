pub mod env;
pub mod modules;
pub mod query;
pub mod records;

pub use env::{EnvCommands, handle_env_command};
pub use modules::{describe_command, login_command, types_command};
pub use query::{QueryArgs, handle_query_command};
pub use records::{delete_command, retrieve_command, sync_command};
