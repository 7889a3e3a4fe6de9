// SPDX-License-Identifier: Apache-2.0

mod client;
mod config;
mod error;
mod event;
mod lease;
mod mac;
mod msg;
mod option;
mod state;
mod time;
mod traits;
mod validate;

pub use crate::client::{DhcpV4Client, DhcpV4EventHandler};
pub use crate::config::DhcpV4Config;
pub use crate::error::{DhcpError, ErrorKind};
pub use crate::event::DhcpV4ClientEvent;
pub use crate::lease::DhcpV4LeaseInfo;
pub use crate::msg::{DHCP_CLIENT_PORT, DHCP_SERVER_PORT};
pub use crate::state::DhcpV4State;
pub use crate::time::Ticks;
pub use crate::traits::{
    DhcpInterface, DhcpPlatform, DhcpV4RecvMeta, SendOutcome,
};

pub(crate) use crate::error::ErrorContext;
