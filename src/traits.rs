// SPDX-License-Identifier: Apache-2.0

use std::net::Ipv4Addr;

use crate::time::Ticks;

/// Outcome of handing a datagram to the transport.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SendOutcome {
    /// The datagram left the interface (or was queued for transmission).
    Sent,
    /// The destination needs ARP resolution first. The transport has
    /// queued the datagram or dropped it, and has registered the client
    /// for a [`crate::DhcpV4Client::handle_send_retry`] callback once
    /// resolution completes.
    ArpPending,
}

/// Monotonic clock and the single one-shot timer the client runs on.
///
/// The clock must never jump backwards and should keep counting across
/// system suspend. `now()` values wrap; the client only compares
/// timestamps within `max_timer_span()` of each other.
pub trait DhcpPlatform {
    /// Current monotonic time in ticks.
    fn now(&self) -> Ticks;

    /// Ticks per second, constant for the lifetime of the platform.
    fn tick_hz(&self) -> u64;

    /// Largest future offset in ticks that can be requested without wrap
    /// ambiguity. Must cover at least 255 seconds.
    fn max_timer_span(&self) -> Ticks;

    /// Arm the one-shot timer to fire
    /// [`crate::DhcpV4Client::handle_timer`] at the given absolute
    /// instant. Re-arming replaces any earlier arming.
    fn timer_set(&mut self, expire_at: Ticks);

    /// Disarm the timer. No-op when the timer is not armed.
    fn timer_unset(&mut self);
}

/// The Ethernet interface and UDP transport the client drives.
///
/// The host delivers the matching input streams back into the client:
/// datagrams received on UDP port 68 go to
/// [`crate::DhcpV4Client::handle_message`], observed ARP packets (while
/// watching) to [`crate::DhcpV4Client::handle_arp`] and link transitions
/// to [`crate::DhcpV4Client::handle_link_change`].
pub trait DhcpInterface {
    /// MAC address of the interface.
    fn mac_address(&self) -> [u8; 6];

    /// Current interface MTU.
    fn mtu(&self) -> u16;

    /// Current link state.
    fn link_up(&self) -> bool;

    /// Send a DHCP message from UDP port 68 to port 67 on `dst`. When
    /// `src` is unspecified the transport must permit the non-local
    /// source address, and broadcast destinations must be allowed.
    fn send_dhcp(
        &mut self,
        payload: &[u8],
        src: Ipv4Addr,
        dst: Ipv4Addr,
        ttl: u8,
    ) -> SendOutcome;

    /// Drop any pending send-retry registration. No-op when none exists.
    fn cancel_send_retry(&mut self);

    /// Transmit an ARP request for `target` (sender IP 0.0.0.0).
    fn send_arp_probe(&mut self, target: Ipv4Addr);

    /// Start or stop reporting observed ARP packets through
    /// [`crate::DhcpV4Client::handle_arp`]. Redundant calls are no-ops.
    fn arp_watch(&mut self, enable: bool);

    /// Install the IPv4 address and the default gateway (clearing the
    /// gateway when `None`). Replaces any previous configuration.
    fn set_ip4_config(
        &mut self,
        addr: Ipv4Addr,
        prefix_len: u8,
        gateway: Option<Ipv4Addr>,
    );

    /// Withdraw the address and gateway. No-op when nothing is set.
    fn clear_ip4_config(&mut self);
}

/// Addressing metadata of a received DHCP datagram.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DhcpV4RecvMeta {
    /// Source IP address of the datagram.
    pub src_addr: Ipv4Addr,
    /// Source UDP port.
    pub src_port: u16,
    /// Source MAC address of the Ethernet frame.
    pub src_mac: [u8; 6],
}
