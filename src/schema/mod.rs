pub mod types;
pub mod catalog;
pub mod validator;
pub mod resolved;
pub mod loader;

pub use types::*;
pub use catalog::*;
pub use validator::*;
pub use resolved::*;
pub use loader::*;
