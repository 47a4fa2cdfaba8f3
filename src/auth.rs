//! Grant-domain identifiers, entities, scopes, and issued token models.

pub mod client;
pub mod id;
pub mod scope;
pub mod token;
pub mod user;

pub use client::*;
pub use id::*;
pub use scope::*;
pub use token::{record::*, secret::*};
pub use user::*;
