// SPDX-License-Identifier: Apache-2.0

/// DHCPv4 client state.
/// RFC 2131 protocol states plus the link/reset bookkeeping states the
/// client needs to drive a real interface.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum DhcpV4State {
    /// No link, timer idle, no address assigned
    #[default]
    LinkDown,
    /// Cooling off after a failure, waiting to restart discovery
    Resetting,
    /// Requesting a previously held address without discovery
    Rebooting,
    /// Broadcasting DHCPDISCOVER and waiting for DHCPOFFER
    Selecting,
    /// Sent DHCPREQUEST for an offered address, waiting for DHCPACK
    Requesting,
    /// Probing the offered address with ARP before binding
    Checking,
    /// Lease active, waiting for the renewal time
    Bound,
    /// T1 expired, unicasting DHCPREQUEST to the leasing server
    Renewing,
    /// T2 expired, broadcasting DHCPREQUEST to any server
    Rebinding,
}

impl std::fmt::Display for DhcpV4State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::LinkDown => "link_down",
                Self::Resetting => "resetting",
                Self::Rebooting => "rebooting",
                Self::Selecting => "selecting",
                Self::Requesting => "requesting",
                Self::Checking => "checking",
                Self::Bound => "bound",
                Self::Renewing => "renewing",
                Self::Rebinding => "rebinding",
            }
        )
    }
}

impl DhcpV4State {
    /// The interface holds an address exactly in these states.
    pub fn has_lease(&self) -> bool {
        matches!(self, Self::Bound | Self::Renewing | Self::Rebinding)
    }

    pub(crate) fn is_expecting_reply(&self) -> bool {
        matches!(
            self,
            Self::Requesting | Self::Renewing | Self::Rebinding | Self::Rebooting
        )
    }
}
