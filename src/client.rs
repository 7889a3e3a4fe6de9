// SPDX-License-Identifier: Apache-2.0

use std::net::Ipv4Addr;

use rand::Rng;

use crate::{
    mac::mac_to_string,
    msg::{
        DhcpV4Message, DhcpV4MessageType, DhcpV4Reply, ARP_HW_TYPE_ETHERNET,
        BOOTREPLY, DHCP_SERVER_PORT, HW_ADDR_LEN_ETHERNET,
    },
    option::DhcpV4SendOptions,
    time::{DhcpTimer, Ticks},
    traits::{DhcpInterface, DhcpPlatform, DhcpV4RecvMeta, SendOutcome},
    validate::{check_and_fixup_ack, check_offered_addr},
    DhcpError, DhcpV4ClientEvent, DhcpV4Config, DhcpV4LeaseInfo, DhcpV4State,
    ErrorKind,
};

// Message text included in a DHCPDECLINE triggered by an ARP response for
// the offered address.
const DECLINE_MESSAGE_ARP_RESPONSE: &str = "ArpResponse";

// IPv4 header (20) plus UDP header (8) subtracted from the MTU gives the
// value advertised via the maximum DHCP message size option.
const IP_UDP_HEADER_LEN: u16 = 28;

// RFC 2131: a DHCP client must be prepared to receive a message of up to
// 576 octets, so never advertise less.
const MIN_DHCP_MESSAGE_SIZE: u16 = 576;

/// Callback reporting significant lease events.
///
/// The callback is always the last side effect of the handler invocation
/// that triggered it. It is not allowed to drop the client from within the
/// callback.
pub type DhcpV4EventHandler = Box<dyn FnMut(DhcpV4ClientEvent)>;

/// RFC 2131 DHCPv4 client driving a single Ethernet interface.
///
/// The client is sans-IO: the host event loop owns the sockets and the
/// timer and feeds the client through the `handle_*` methods, each of
/// which runs to completion without blocking. The client reacts by sending
/// messages, arming its timer and applying interface configuration through
/// the [`DhcpPlatform`] and [`DhcpInterface`] collaborators.
pub struct DhcpV4Client<P: DhcpPlatform, I: DhcpInterface> {
    config: DhcpV4Config,
    platform: P,
    iface: I,
    handler: Option<DhcpV4EventHandler>,
    timer: DhcpTimer,
    state: DhcpV4State,
    xid: u32,
    rtx_timeout: u8,
    // Discover/request/ARP-query counter within the current phase.
    request_count: u8,
    // Seconds of the current lease consumed, anchored at the instant the
    // request that produced the lease was first sent. Also pre-advanced to
    // the next timer expiry while waiting, see timer_bound_renewing_rebinding.
    lease_time_passed: u32,
    request_send_time: Ticks,
    request_send_time_passed: u32,
    info: DhcpV4LeaseInfo,
}

impl<P: DhcpPlatform, I: DhcpInterface> DhcpV4Client<P, I> {
    /// Create the client bound to an interface.
    ///
    /// The client assumes exclusive control over the IPv4 address and
    /// gateway assignment of the interface, both initially unassigned.
    /// If the link is already up, address acquisition starts immediately.
    pub fn new(
        platform: P,
        iface: I,
        config: DhcpV4Config,
        handler: Option<DhcpV4EventHandler>,
    ) -> Result<Self, DhcpError> {
        config.validate()?;
        let timer = DhcpTimer::new(&platform)?;
        let mut info = DhcpV4LeaseInfo::default();
        if let Some(ip) = config.request_ip {
            info.ip_address = ip;
        }
        let mut client = Self {
            config,
            platform,
            iface,
            handler,
            timer,
            state: DhcpV4State::LinkDown,
            xid: 0,
            rtx_timeout: 0,
            request_count: 0,
            lease_time_passed: 0,
            request_send_time: 0,
            request_send_time_passed: 0,
            info,
        };
        if client.iface.link_up() {
            client.start_discovery_or_rebooting();
        } else {
            log::debug!("Link is down, waiting for link up");
        }
        Ok(client)
    }

    /// True while a lease is active and the address is assigned.
    pub fn has_lease(&self) -> bool {
        self.state.has_lease()
    }

    /// Information about the current lease, `None` unless
    /// [`DhcpV4Client::has_lease`] returns true.
    pub fn lease_info(&self) -> Option<&DhcpV4LeaseInfo> {
        if self.has_lease() {
            Some(&self.info)
        } else {
            None
        }
    }

    pub fn state(&self) -> DhcpV4State {
        self.state
    }

    /// Release the current lease.
    ///
    /// Unicasts a DHCPRELEASE to the leasing server, withdraws the
    /// interface configuration without reporting an event (the withdrawal
    /// is caller-initiated) and restarts discovery after the reset
    /// timeout. The message is fire-and-forget, no reply is expected.
    pub fn release(&mut self) -> Result<(), DhcpError> {
        if !self.has_lease() {
            return Err(DhcpError::new(
                ErrorKind::NoLease,
                "No active lease to release".to_string(),
            ));
        }
        log::debug!(
            "Releasing lease {} to server {}",
            self.info.ip_address,
            self.info.server_addr
        );
        self.send_release();
        self.iface.clear_ip4_config();
        self.info.ip_address = Ipv4Addr::UNSPECIFIED;
        self.state = DhcpV4State::Resetting;
        self.timer
            .set_after(&mut self.platform, u32::from(self.config.reset_timeout));
        Ok(())
    }

    /// The one-shot timer fired.
    pub fn handle_timer(&mut self) {
        match self.state {
            DhcpV4State::LinkDown => {
                log::error!("BUG: Timer fired in link_down state");
            }
            DhcpV4State::Resetting => self.start_discovery(),
            DhcpV4State::Selecting => self.timer_selecting(),
            DhcpV4State::Rebooting | DhcpV4State::Requesting => {
                self.timer_rebooting_requesting()
            }
            DhcpV4State::Checking => self.timer_checking(),
            DhcpV4State::Bound
            | DhcpV4State::Renewing
            | DhcpV4State::Rebinding => self.timer_bound_renewing_rebinding(),
        }
    }

    /// A DHCP datagram arrived on UDP port 68.
    pub fn handle_message(&mut self, meta: DhcpV4RecvMeta, payload: &[u8]) {
        if meta.src_port != DHCP_SERVER_PORT {
            log::debug!(
                "Dropping DHCP message from unexpected source port {}",
                meta.src_port
            );
            return;
        }
        // Replies must come from a unicast source.
        if meta.src_addr.is_unspecified()
            || meta.src_addr.is_broadcast()
            || meta.src_addr.is_multicast()
        {
            log::debug!(
                "Dropping DHCP message from non-unicast source {}",
                meta.src_addr
            );
            return;
        }
        // In these states no reply is expected.
        if matches!(
            self.state,
            DhcpV4State::LinkDown
                | DhcpV4State::Resetting
                | DhcpV4State::Checking
                | DhcpV4State::Bound
        ) {
            return;
        }

        let reply =
            match DhcpV4Reply::parse(payload, self.config.max_dns_servers) {
                Ok(r) => r,
                Err(e) => {
                    log::info!("Ignoring invalid DHCP message: {e}");
                    return;
                }
            };

        if reply.op != BOOTREPLY
            || reply.htype != ARP_HW_TYPE_ETHERNET
            || reply.hlen != HW_ADDR_LEN_ETHERNET
        {
            log::debug!(
                "Dropping DHCP message with op {} htype {} hlen {}",
                reply.op,
                reply.htype,
                reply.hlen
            );
            return;
        }
        if reply.xid != self.xid {
            log::debug!(
                "Dropping DHCP message due to xid miss-match. \
                 Expecting {}, got {}",
                self.xid,
                reply.xid
            );
            return;
        }
        if reply.chaddr_mac() != self.iface.mac_address() {
            log::debug!(
                "Dropping DHCP message for foreign chaddr {}",
                mac_to_string(&reply.chaddr_mac())
            );
            return;
        }

        let msg_type = match reply.options.message_type {
            Some(
                t @ (DhcpV4MessageType::Offer
                | DhcpV4MessageType::Ack
                | DhcpV4MessageType::Nack),
            ) => t,
            Some(t) => {
                log::debug!("Dropping unexpected {t} message");
                return;
            }
            None => {
                log::debug!("Dropping DHCP message without a message type");
                return;
            }
        };
        let server_id = match reply.options.server_identifier {
            Some(id) => id,
            None => {
                log::debug!(
                    "Dropping DHCP message without a server identifier"
                );
                return;
            }
        };

        match msg_type {
            DhcpV4MessageType::Nack => self.process_nack(server_id),
            DhcpV4MessageType::Offer => self.process_offer(&reply, server_id),
            _ => self.process_ack(&reply, server_id, &meta),
        }
    }

    /// An ARP packet was observed while watching is enabled.
    pub fn handle_arp(&mut self, sender_ip: Ipv4Addr, sender_mac: [u8; 6]) {
        if self.state != DhcpV4State::Checking {
            log::error!(
                "BUG: Got ARP observation in {} state, ignoring",
                self.state
            );
            return;
        }
        if sender_ip != self.info.ip_address {
            return;
        }
        log::info!(
            "Offered address {} is already claimed by {}, declining",
            sender_ip,
            mac_to_string(&sender_mac)
        );
        self.send_decline();
        self.iface.arp_watch(false);
        self.go_resetting(false);
    }

    /// The interface link state changed.
    pub fn handle_link_change(&mut self) {
        let link_up = self.iface.link_up();

        if self.state == DhcpV4State::LinkDown {
            if link_up {
                log::debug!("Link is up, starting address acquisition");
                self.start_discovery_or_rebooting();
            }
        } else if !link_up {
            log::debug!("Link went down in {} state", self.state);
            let had_lease = self.has_lease();

            // Keep the remembered address only if it is assigned or being
            // requested via rebooting, so a later link up reboots with it.
            if !(had_lease || self.state == DhcpV4State::Rebooting) {
                self.info.ip_address = Ipv4Addr::UNSPECIFIED;
            }

            self.state = DhcpV4State::LinkDown;

            self.iface.arp_watch(false);
            self.iface.cancel_send_retry();
            self.timer.unset(&mut self.platform);

            if had_lease {
                self.dhcp_down(true, true);
            }
        }
    }

    /// The transport finished ARP resolution for an earlier send that
    /// returned [`SendOutcome::ArpPending`].
    pub fn handle_send_retry(&mut self) {
        // Entry into every state handled here sends a message, which
        // cancels any stale registration, so a callback that arrives here
        // always refers to the current phase.
        match self.state {
            DhcpV4State::Selecting => self.send_discover(),
            DhcpV4State::Requesting
            | DhcpV4State::Renewing
            | DhcpV4State::Rebinding
            | DhcpV4State::Rebooting => self.send_request(),
            _ => (),
        }
    }

    fn new_xid(&mut self) {
        self.xid = if self.config.random_xid {
            rand::thread_rng().gen()
        } else {
            self.platform.now() as u32
        };
        log::debug!("New xid {:08x}", self.xid);
    }

    fn reset_rtx_timeout(&mut self) {
        self.rtx_timeout = self.config.base_rtx_timeout;
    }

    // Double the retransmission timeout, capped at the maximum.
    fn double_rtx_timeout(&mut self) {
        self.rtx_timeout = if self.rtx_timeout > self.config.max_rtx_timeout / 2
        {
            self.config.max_rtx_timeout
        } else {
            2 * self.rtx_timeout
        };
    }

    fn set_timer_for_rtx(&mut self) {
        self.timer
            .set_after(&mut self.platform, u32::from(self.rtx_timeout));
    }

    fn start_discovery_or_rebooting(&mut self) {
        self.new_xid();
        self.request_count = 1;

        if self.info.ip_address.is_unspecified() {
            self.state = DhcpV4State::Selecting;
            log::debug!("Entering selecting state, sending DHCPDISCOVER");
            self.send_discover();
        } else {
            self.state = DhcpV4State::Rebooting;
            // Renewal, rebinding and lease timeout are measured from the
            // first request of the cycle.
            self.request_send_time = self.platform.now();
            log::debug!(
                "Entering rebooting state, requesting previous address {}",
                self.info.ip_address
            );
            self.send_request();
        }

        self.reset_rtx_timeout();
        self.set_timer_for_rtx();
    }

    fn start_discovery(&mut self) {
        // Forget any remembered address to prevent rebooting.
        self.info.ip_address = Ipv4Addr::UNSPECIFIED;
        self.start_discovery_or_rebooting();
    }

    fn handle_expired_lease(&mut self, had_lease: bool) {
        log::debug!("Lease expired, restarting discovery");
        self.start_discovery();
        if had_lease {
            self.dhcp_down(true, false);
        }
    }

    fn timer_selecting(&mut self) {
        // Retransmit the discover, regenerating the xid after it has been
        // reused enough times.
        if self.request_count >= self.config.xid_reuse_max {
            self.request_count = 1;
            self.new_xid();
        } else {
            self.request_count += 1;
        }
        self.send_discover();
        self.double_rtx_timeout();
        self.set_timer_for_rtx();
    }

    fn timer_rebooting_requesting(&mut self) {
        let limit = if self.state == DhcpV4State::Rebooting {
            self.config.max_reboot_requests
        } else {
            self.config.max_requests
        };
        if self.request_count >= limit {
            log::debug!(
                "Sent {limit} requests in {} state with no reply, \
                 reverting to discovery",
                self.state
            );
            self.start_discovery();
            return;
        }
        self.request_count += 1;

        // request_send_time is not updated here: lease timing stays
        // anchored at the first request of the cycle.
        self.send_request();
        self.double_rtx_timeout();
        self.set_timer_for_rtx();
    }

    fn timer_checking(&mut self) {
        // No conflicting ARP response within the timeout.
        if self.request_count < self.config.num_arp_queries {
            self.request_count += 1;
            self.timer.set_after(
                &mut self.platform,
                u32::from(self.config.arp_response_timeout),
            );
            self.iface.send_arp_probe(self.info.ip_address);
        } else {
            self.iface.arp_watch(false);
            self.go_bound();
        }
    }

    // Timer expiry in bound (time to renew), renewing (retransmit or move
    // to rebinding) or rebinding (retransmit or lease timeout). The timer
    // may also have been set short of the target because the interval
    // exceeded the platform span; elapsed time is always recomputed from
    // the clock so that intermediate expirations cause no drift, and
    // states are skipped if more time passed than expected.
    fn timer_bound_renewing_rebinding(&mut self) {
        debug_assert!(self.lease_time_passed <= self.info.lease_time_sec);

        let now = self.platform.now();
        let passed_sec = self
            .timer
            .ticks_to_sec(now.wrapping_sub(self.timer.set_time()));

        if passed_sec >= self.info.lease_time_sec - self.lease_time_passed {
            self.handle_expired_lease(true);
            return;
        }

        let prev_lease_time_passed = self.lease_time_passed;
        self.lease_time_passed += passed_sec;

        if self.state != DhcpV4State::Rebinding
            && self.lease_time_passed >= self.info.rebinding_time_sec
        {
            log::debug!("Rebinding time reached, broadcasting requests");
            self.state = DhcpV4State::Rebinding;
            self.new_xid();
        } else if self.state == DhcpV4State::Bound
            && self.lease_time_passed >= self.info.renewal_time_sec
        {
            log::debug!("Renewal time reached, contacting leasing server");
            self.state = DhcpV4State::Renewing;
            self.new_xid();
        }

        // Seconds until the timer should next expire, relative to the
        // updated lease_time_passed.
        let mut timer_rel_sec;

        if self.state == DhcpV4State::Bound {
            timer_rel_sec =
                self.info.renewal_time_sec - self.lease_time_passed;
        } else {
            // Next state transition is rebinding while renewing, lease
            // timeout while rebinding.
            let next_state_sec = if self.state == DhcpV4State::Renewing {
                self.info.rebinding_time_sec
            } else {
                self.info.lease_time_sec
            };
            let next_state_rel_sec = next_state_sec - self.lease_time_passed;

            // The retransmission may happen earlier than this when the
            // interval is clipped to the platform span; that is fine.
            let rtx_rel_sec = u32::from(self.config.min_renew_rtx_timeout)
                .max(next_state_rel_sec / 2);

            timer_rel_sec = next_state_rel_sec.min(rtx_rel_sec);

            self.send_request();
            self.request_send_time = now;
            self.request_send_time_passed = self.lease_time_passed;
        }

        timer_rel_sec = timer_rel_sec.min(self.timer.max_timer_sec());

        // Arm at an absolute instant derived from the previous expiry so
        // that handler latency does not accumulate into the schedule.
        self.lease_time_passed += timer_rel_sec;
        let expire_at = self.timer.set_time().wrapping_add(
            self.timer.sec_to_ticks_unchecked(
                self.lease_time_passed - prev_lease_time_passed,
            ),
        );
        self.timer.set_at(&mut self.platform, expire_at);
    }

    fn process_nack(&mut self, server_id: Ipv4Addr) {
        // A NAK is only valid while a reply to a request is expected.
        if !self.state.is_expecting_reply() {
            return;
        }
        if self.state == DhcpV4State::Requesting
            && server_id != self.info.server_id
        {
            log::debug!(
                "Dropping NACK from foreign server {server_id}, \
                 expecting {}",
                self.info.server_id
            );
            return;
        }
        log::info!("Got NACK from server {server_id} in {} state", self.state);
        // From requesting, go through resetting so a NACKing server
        // cannot trap the client in a tight discover-offer-request-NACK
        // loop.
        let discover_immediately = self.state != DhcpV4State::Requesting;
        self.go_resetting(discover_immediately);
    }

    fn process_offer(&mut self, reply: &DhcpV4Reply, server_id: Ipv4Addr) {
        if self.state != DhcpV4State::Selecting {
            return;
        }
        if !check_offered_addr(reply.yiaddr) {
            log::debug!("Dropping OFFER of invalid address {}", reply.yiaddr);
            return;
        }
        log::debug!("Got OFFER of {} from server {server_id}", reply.yiaddr);
        self.info.ip_address = reply.yiaddr;
        self.info.server_id = server_id;

        self.state = DhcpV4State::Requesting;

        // The request must carry the xid of the offer, which the current
        // xid already is.
        self.request_send_time = self.platform.now();
        self.send_request();
        self.request_count = 1;
        self.reset_rtx_timeout();
        self.set_timer_for_rtx();
    }

    fn process_ack(
        &mut self,
        reply: &DhcpV4Reply,
        server_id: Ipv4Addr,
        meta: &DhcpV4RecvMeta,
    ) {
        if !self.state.is_expecting_reply() {
            return;
        }

        let fixup = match check_and_fixup_ack(reply.yiaddr, &reply.options) {
            Some(f) => f,
            None => {
                log::info!(
                    "Ignoring invalid DHCPACK for address {}",
                    reply.yiaddr
                );
                return;
            }
        };

        if self.state == DhcpV4State::Requesting {
            // The acknowledgement must match the accepted offer.
            if reply.yiaddr != self.info.ip_address
                || server_id != self.info.server_id
            {
                log::debug!(
                    "Dropping ACK not matching the offer: address {} \
                     server {server_id}",
                    reply.yiaddr
                );
                return;
            }
        } else if self.state != DhcpV4State::Rebooting {
            // While renewing or rebinding, request_send_time is only valid
            // if the timer is still on its first expiration since the
            // request went out. An ACK cannot plausibly take longer than
            // the platform timer span to arrive.
            debug_assert!(
                self.lease_time_passed >= self.request_send_time_passed
            );
            if self.lease_time_passed - self.request_send_time_passed
                > self.timer.max_timer_sec()
            {
                log::debug!("Dropping implausibly late ACK");
                return;
            }
        }

        self.info.ip_address = reply.yiaddr;
        self.info.server_id = server_id;
        self.info.server_addr = meta.src_addr;
        self.info.lease_time_sec = fixup.lease_time_sec;
        self.info.renewal_time_sec = fixup.renewal_time_sec;
        self.info.rebinding_time_sec = fixup.rebinding_time_sec;
        self.info.subnet_mask = fixup.subnet_mask;
        self.info.router = fixup.router;
        self.info.dns_servers = reply.options.dns_servers.clone();
        self.info.server_mac = meta.src_mac;

        if self.state == DhcpV4State::Requesting {
            // Probe the address with ARP before binding.
            self.go_checking();
        } else {
            self.go_bound();
        }
    }

    fn go_resetting(&mut self, discover_immediately: bool) {
        let had_lease = self.has_lease();

        if discover_immediately {
            self.start_discovery();
        } else {
            log::debug!(
                "Entering resetting state for {} seconds",
                self.config.reset_timeout
            );
            self.state = DhcpV4State::Resetting;
            self.timer.set_after(
                &mut self.platform,
                u32::from(self.config.reset_timeout),
            );
        }

        if had_lease {
            self.dhcp_down(true, false);
        }
    }

    fn go_checking(&mut self) {
        log::debug!("Probing offered address {} with ARP", self.info.ip_address);
        self.state = DhcpV4State::Checking;
        self.request_count = 1;
        self.iface.arp_watch(true);
        self.timer.set_after(
            &mut self.platform,
            u32::from(self.config.arp_response_timeout),
        );
        self.iface.send_arp_probe(self.info.ip_address);
    }

    fn go_bound(&mut self) {
        debug_assert!(matches!(
            self.state,
            DhcpV4State::Checking
                | DhcpV4State::Renewing
                | DhcpV4State::Rebinding
                | DhcpV4State::Rebooting
        ));

        let had_lease = self.has_lease();
        let now = self.platform.now();

        // Lease seconds already consumed between sending the request and
        // binding now.
        self.lease_time_passed = self
            .timer
            .ticks_to_sec(now.wrapping_sub(self.request_send_time));

        if self.lease_time_passed >= self.info.lease_time_sec {
            self.handle_expired_lease(had_lease);
            return;
        }

        // No need to check whether renewal is already due, the timer
        // handler takes care of that on its first expiry.
        self.state = DhcpV4State::Bound;

        let mut timer_rel_sec =
            if self.lease_time_passed <= self.info.renewal_time_sec {
                self.info.renewal_time_sec - self.lease_time_passed
            } else {
                0
            };
        timer_rel_sec = timer_rel_sec.min(self.timer.max_timer_sec());

        self.lease_time_passed += timer_rel_sec;
        let expire_at = self.request_send_time.wrapping_add(
            self.timer.sec_to_ticks_unchecked(self.lease_time_passed),
        );
        self.timer.set_at(&mut self.platform, expire_at);

        log::debug!(
            "Bound to {}/{} for {} seconds (renewal {}, rebinding {})",
            self.info.ip_address,
            self.info.prefix_length(),
            self.info.lease_time_sec,
            self.info.renewal_time_sec,
            self.info.rebinding_time_sec
        );
        self.dhcp_up(had_lease);
    }

    fn dhcp_up(&mut self, renewed: bool) {
        self.iface.set_ip4_config(
            self.info.ip_address,
            self.info.prefix_length(),
            self.info.router,
        );
        let event = if renewed {
            DhcpV4ClientEvent::LeaseRenewed
        } else {
            DhcpV4ClientEvent::LeaseObtained
        };
        self.notify(event);
    }

    fn dhcp_down(&mut self, call_callback: bool, link_down: bool) {
        self.iface.clear_ip4_config();
        if call_callback {
            let event = if link_down {
                DhcpV4ClientEvent::LinkDown
            } else {
                DhcpV4ClientEvent::LeaseLost
            };
            self.notify(event);
        }
    }

    // Must stay the last side effect of any handler invocation.
    fn notify(&mut self, event: DhcpV4ClientEvent) {
        if let Some(handler) = self.handler.as_mut() {
            handler(event);
        }
    }

    fn send_discover(&mut self) {
        debug_assert!(self.state == DhcpV4State::Selecting);
        let opts = DhcpV4SendOptions::new(DhcpV4MessageType::Discovery);
        self.send_dhcp_message(
            opts,
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::BROADCAST,
        );
    }

    fn send_request(&mut self) {
        debug_assert!(self.state.is_expecting_reply());

        let mut opts = DhcpV4SendOptions::new(DhcpV4MessageType::Request);
        let mut ciaddr = Ipv4Addr::UNSPECIFIED;
        let mut dst_addr = Ipv4Addr::BROADCAST;

        if self.state == DhcpV4State::Requesting {
            opts.server_identifier = Some(self.info.server_id);
        }
        if self.state == DhcpV4State::Renewing {
            dst_addr = self.info.server_addr;
        }
        if matches!(
            self.state,
            DhcpV4State::Requesting | DhcpV4State::Rebooting
        ) {
            opts.requested_ip_address = Some(self.info.ip_address);
        } else {
            // Renewing or rebinding, the held address goes into ciaddr.
            ciaddr = self.info.ip_address;
        }

        self.send_dhcp_message(opts, ciaddr, dst_addr);
    }

    fn send_decline(&mut self) {
        debug_assert!(self.state == DhcpV4State::Checking);

        let mut opts = DhcpV4SendOptions::new(DhcpV4MessageType::Decline);
        opts.server_identifier = Some(self.info.server_id);
        opts.requested_ip_address = Some(self.info.ip_address);
        opts.message = Some(DECLINE_MESSAGE_ARP_RESPONSE.to_string());
        self.send_dhcp_message(
            opts,
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::BROADCAST,
        );
    }

    fn send_release(&mut self) {
        debug_assert!(self.has_lease());

        let mut opts = DhcpV4SendOptions::new(DhcpV4MessageType::Release);
        opts.server_identifier = Some(self.info.server_id);
        self.send_dhcp_message(
            opts,
            self.info.ip_address,
            self.info.server_addr,
        );
    }

    fn send_dhcp_message(
        &mut self,
        mut opts: DhcpV4SendOptions,
        ciaddr: Ipv4Addr,
        dst_addr: Ipv4Addr,
    ) {
        // A retry of a previous message is never wanted once a newer one
        // goes out.
        self.iface.cancel_send_retry();

        let msg_type = opts.message_type;
        let is_terminal = matches!(
            msg_type,
            DhcpV4MessageType::Decline | DhcpV4MessageType::Release
        );

        if !self.config.client_id.is_empty() {
            opts.client_id = self.config.client_id.clone();
        }
        if !self.config.vendor_class_id.is_empty() && !is_terminal {
            opts.vendor_class_id = self.config.vendor_class_id.clone();
        }
        if !is_terminal {
            opts.parameter_request_list = true;
            opts.max_message_size = Some(
                self.iface
                    .mtu()
                    .saturating_sub(IP_UDP_HEADER_LEN)
                    .max(MIN_DHCP_MESSAGE_SIZE),
            );
        }

        let msg = DhcpV4Message::new(
            self.xid,
            ciaddr,
            self.iface.mac_address(),
            opts,
        );
        let payload = msg.to_dhcp_packet();

        log::debug!("Sending {msg_type} to {dst_addr}");
        match self
            .iface
            .send_dhcp(&payload, ciaddr, dst_addr, self.config.ttl)
        {
            SendOutcome::Sent => (),
            SendOutcome::ArpPending => {
                log::debug!(
                    "{msg_type} queued behind ARP resolution of {dst_addr}, \
                     waiting for retry callback"
                );
            }
        }
    }
}

impl<P: DhcpPlatform, I: DhcpInterface> Drop for DhcpV4Client<P, I> {
    fn drop(&mut self) {
        // Remove any configuration that might have been done, without
        // reporting an event.
        self.iface.arp_watch(false);
        self.iface.cancel_send_retry();
        self.timer.unset(&mut self.platform);
        self.iface.clear_ip4_config();
    }
}
