pub mod branch;
pub mod connection_log;
pub mod product;
pub mod user;

pub use branch::{Branch, BranchFields, BranchPatch};
pub use connection_log::ConnectionLog;
pub use product::{Product, ProductFields, ProductPatch};
pub use user::{Role, User};
