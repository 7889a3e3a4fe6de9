// SPDX-License-Identifier: Apache-2.0

/// Lease event reported to the application handler.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DhcpV4ClientEvent {
    /// A lease has been obtained while no lease was held. Reported after
    /// discovery or after the link was re-established via rebooting.
    LeaseObtained,
    /// A new lease replaced an existing one, possibly with different
    /// addresses. Reported from the renewing or rebinding context.
    LeaseRenewed,
    /// An existing lease was withdrawn due to timeout, NAK or address
    /// conflict. Not reported when the withdrawal was caused by link loss.
    LeaseLost,
    /// The link went down while a lease was held and the address
    /// configuration has been removed.
    LinkDown,
}

impl std::fmt::Display for DhcpV4ClientEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::LeaseObtained => "LeaseObtained",
                Self::LeaseRenewed => "LeaseRenewed",
                Self::LeaseLost => "LeaseLost",
                Self::LinkDown => "LinkDown",
            }
        )
    }
}
