// SPDX-License-Identifier: Apache-2.0

// Shared between the integration test crates, each of which uses a
// different subset.
#![allow(dead_code)]

use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;

use dhcp4c::{
    DhcpInterface, DhcpPlatform, DhcpV4Client, DhcpV4ClientEvent,
    DhcpV4Config, DhcpV4RecvMeta, SendOutcome, Ticks,
};

pub const MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
pub const SERVER_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0xff, 0x01];
pub const TICK_HZ: u64 = 1000;
pub const MTU: u16 = 1500;

pub const DHCPDISCOVER: u8 = 1;
pub const DHCPOFFER: u8 = 2;
pub const DHCPREQUEST: u8 = 3;
pub const DHCPDECLINE: u8 = 4;
pub const DHCPACK: u8 = 5;
pub const DHCPNAK: u8 = 6;
pub const DHCPRELEASE: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub payload: Vec<u8>,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub ttl: u8,
}

#[derive(Debug)]
pub struct TestNet {
    pub now: Ticks,
    pub timer_span: Ticks,
    pub timer: Option<Ticks>,
    pub link_up: bool,
    pub sent: Vec<SentMessage>,
    pub arp_probes: Vec<Ipv4Addr>,
    pub arp_watching: bool,
    pub retry_registered: bool,
    pub arp_pending_next_send: bool,
    pub ip_config: Option<(Ipv4Addr, u8, Option<Ipv4Addr>)>,
    pub events: Vec<DhcpV4ClientEvent>,
}

impl TestNet {
    pub fn new(link_up: bool, timer_span: Ticks) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            now: 0,
            timer_span,
            timer: None,
            link_up,
            sent: Vec::new(),
            arp_probes: Vec::new(),
            arp_watching: false,
            retry_registered: false,
            arp_pending_next_send: false,
            ip_config: None,
            events: Vec::new(),
        }))
    }
}

pub struct MockPlatform(pub Rc<RefCell<TestNet>>);

impl DhcpPlatform for MockPlatform {
    fn now(&self) -> Ticks {
        self.0.borrow().now
    }

    fn tick_hz(&self) -> u64 {
        TICK_HZ
    }

    fn max_timer_span(&self) -> Ticks {
        self.0.borrow().timer_span
    }

    fn timer_set(&mut self, expire_at: Ticks) {
        self.0.borrow_mut().timer = Some(expire_at);
    }

    fn timer_unset(&mut self) {
        self.0.borrow_mut().timer = None;
    }
}

pub struct MockIface(pub Rc<RefCell<TestNet>>);

impl DhcpInterface for MockIface {
    fn mac_address(&self) -> [u8; 6] {
        MAC
    }

    fn mtu(&self) -> u16 {
        MTU
    }

    fn link_up(&self) -> bool {
        self.0.borrow().link_up
    }

    fn send_dhcp(
        &mut self,
        payload: &[u8],
        src: Ipv4Addr,
        dst: Ipv4Addr,
        ttl: u8,
    ) -> SendOutcome {
        let mut net = self.0.borrow_mut();
        net.sent.push(SentMessage {
            payload: payload.to_vec(),
            src,
            dst,
            ttl,
        });
        if net.arp_pending_next_send {
            net.arp_pending_next_send = false;
            net.retry_registered = true;
            SendOutcome::ArpPending
        } else {
            SendOutcome::Sent
        }
    }

    fn cancel_send_retry(&mut self) {
        self.0.borrow_mut().retry_registered = false;
    }

    fn send_arp_probe(&mut self, target: Ipv4Addr) {
        self.0.borrow_mut().arp_probes.push(target);
    }

    fn arp_watch(&mut self, enable: bool) {
        self.0.borrow_mut().arp_watching = enable;
    }

    fn set_ip4_config(
        &mut self,
        addr: Ipv4Addr,
        prefix_len: u8,
        gateway: Option<Ipv4Addr>,
    ) {
        self.0.borrow_mut().ip_config = Some((addr, prefix_len, gateway));
    }

    fn clear_ip4_config(&mut self) {
        self.0.borrow_mut().ip_config = None;
    }
}

pub struct TestHarness {
    pub net: Rc<RefCell<TestNet>>,
    pub client: DhcpV4Client<MockPlatform, MockIface>,
}

impl TestHarness {
    pub fn new(config: DhcpV4Config, link_up: bool) -> Self {
        Self::with_timer_span(config, link_up, 300_000)
    }

    pub fn with_timer_span(
        config: DhcpV4Config,
        link_up: bool,
        timer_span: Ticks,
    ) -> Self {
        let net = TestNet::new(link_up, timer_span);
        let events = net.clone();
        let client = DhcpV4Client::new(
            MockPlatform(net.clone()),
            MockIface(net.clone()),
            config,
            Some(Box::new(move |event| {
                events.borrow_mut().events.push(event)
            })),
        )
        .unwrap();
        Self { net, client }
    }

    pub fn now(&self) -> Ticks {
        self.net.borrow().now
    }

    pub fn set_now(&mut self, now: Ticks) {
        self.net.borrow_mut().now = now;
    }

    pub fn armed_at(&self) -> Ticks {
        self.net.borrow().timer.expect("timer is not armed")
    }

    /// Advance the clock to the armed instant and fire the timer.
    pub fn fire_timer(&mut self) {
        let expire_at = self.armed_at();
        self.net.borrow_mut().now = expire_at;
        self.client.handle_timer();
    }

    pub fn deliver(&mut self, src_addr: Ipv4Addr, payload: &[u8]) {
        self.client.handle_message(
            DhcpV4RecvMeta {
                src_addr,
                src_port: 67,
                src_mac: SERVER_MAC,
            },
            payload,
        );
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.net.borrow().sent.clone()
    }

    pub fn last_sent(&self) -> SentMessage {
        self.net
            .borrow()
            .sent
            .last()
            .expect("nothing was sent")
            .clone()
    }

    pub fn events(&self) -> Vec<DhcpV4ClientEvent> {
        self.net.borrow().events.clone()
    }
}

/// Build a server reply (BOOTREPLY over Ethernet) addressed to the client.
pub fn server_reply(
    xid: u32,
    yiaddr: Ipv4Addr,
    options: &[(u8, Vec<u8>)],
) -> Vec<u8> {
    let mut raw = vec![0u8; 240];
    raw[0] = 2; // BOOTREPLY
    raw[1] = 1; // Ethernet
    raw[2] = 6;
    raw[4..8].copy_from_slice(&xid.to_be_bytes());
    raw[16..20].copy_from_slice(&yiaddr.octets());
    raw[28..34].copy_from_slice(&MAC);
    raw[236..240].copy_from_slice(&[99, 130, 83, 99]);
    for (code, data) in options {
        raw.push(*code);
        raw.push(data.len() as u8);
        raw.extend_from_slice(data);
    }
    raw.push(255);
    raw
}

pub fn opt_u8(value: u8) -> Vec<u8> {
    vec![value]
}

pub fn opt_u32(value: u32) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub fn opt_ip(ip: Ipv4Addr) -> Vec<u8> {
    ip.octets().to_vec()
}

pub fn xid_of(payload: &[u8]) -> u32 {
    u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]])
}

pub fn ciaddr_of(payload: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(payload[12], payload[13], payload[14], payload[15])
}

pub fn find_option(payload: &[u8], code: u8) -> Option<Vec<u8>> {
    let mut i = 240;
    while i < payload.len() {
        let c = payload[i];
        if c == 0 {
            i += 1;
            continue;
        }
        if c == 255 {
            break;
        }
        let len = payload[i + 1] as usize;
        let data = payload[i + 2..i + 2 + len].to_vec();
        if c == code {
            return Some(data);
        }
        i += 2 + len;
    }
    None
}

pub fn msg_type_of(payload: &[u8]) -> u8 {
    find_option(payload, 53).expect("message has no message type")[0]
}
