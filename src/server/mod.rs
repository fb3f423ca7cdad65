//! DHCPv6 server decision core
//!
//! Request flow: [`Dispatcher`] resolves the client identity, then hands
//! the request to a lease handler, which derives the address and builds
//! the reply through a [`ResponseSender`].

pub mod dispatch;
pub mod eui64;
pub mod identity;
pub mod lease;
pub mod reply;

pub use dispatch::{Dispatcher, Request};
pub use eui64::{synthesize, Prefix};
pub use identity::{resolve, ClientIdentity};
pub use reply::{Dhcp6Action, ResponseSender};
