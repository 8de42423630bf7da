//! Shared types for the transaction broadcast subsystem.
//!
//! Every other crate in the workspace depends on these definitions: the data
//! model for operations and amounts, the signing-provider vocabulary, the
//! error taxonomy and the ledger submission interface.

pub mod account;
pub mod authority;
pub mod errors;
pub mod ledger;
pub mod operation;
pub mod provider;

pub use account::*;
pub use authority::*;
pub use errors::*;
pub use ledger::*;
pub use operation::*;
pub use provider::*;
