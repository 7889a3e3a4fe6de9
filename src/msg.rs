// SPDX-License-Identifier: Apache-2.0

use std::net::Ipv4Addr;

use crate::{
    option::{DhcpV4RecvOptions, DhcpV4SendOptions},
    DhcpError, ErrorKind,
};

pub const DHCP_CLIENT_PORT: u16 = 68;
pub const DHCP_SERVER_PORT: u16 = 67;

pub(crate) const BOOTREQUEST: u8 = 1;
pub(crate) const BOOTREPLY: u8 = 2;
pub(crate) const ARP_HW_TYPE_ETHERNET: u8 = 1;
pub(crate) const HW_ADDR_LEN_ETHERNET: u8 = 6;
const DHCPV4_MAGIC_COOKIE: [u8; 4] = [99u8, 130, 83, 99];

// Fixed header layout (RFC 2131): op(1) htype(1) hlen(1) hops(1) xid(4)
// secs(2) flags(2) ciaddr(4) yiaddr(4) siaddr(4) giaddr(4) chaddr(16)
// sname(64) file(128), followed by the magic cookie and the option area.
const XID_OFFSET: usize = 4;
const SECS_OFFSET: usize = 8;
const FLAGS_OFFSET: usize = 10;
const CIADDR_OFFSET: usize = 12;
const YIADDR_OFFSET: usize = 16;
const SIADDR_OFFSET: usize = 20;
const GIADDR_OFFSET: usize = 24;
const CHADDR_OFFSET: usize = 28;
const SNAME_OFFSET: usize = 44;
const FILE_OFFSET: usize = 108;
const MAGIC_OFFSET: usize = 236;

const MAX_CHADDR_LEN: usize = 16;

// Header, magic cookie and a generously sized option area. Self-emitted
// messages always fit the RFC 2131 minimum datagram.
const MAX_DHCP_SEND_MSG_SIZE: usize = 576;

fn read_u16_be(raw: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([raw[offset], raw[offset + 1]])
}

fn read_u32_be(raw: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        raw[offset],
        raw[offset + 1],
        raw[offset + 2],
        raw[offset + 3],
    ])
}

fn read_ipv4(raw: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(
        raw[offset],
        raw[offset + 1],
        raw[offset + 2],
        raw[offset + 3],
    )
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
#[non_exhaustive]
pub(crate) enum DhcpV4MessageType {
    #[default]
    Discovery = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nack = 6,
    Release = 7,
    Inform = 8,
}

impl std::fmt::Display for DhcpV4MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery => write!(f, "DISCOVERY"),
            Self::Offer => write!(f, "OFFER"),
            Self::Request => write!(f, "REQUEST"),
            Self::Decline => write!(f, "DECLINE"),
            Self::Ack => write!(f, "ACK"),
            Self::Nack => write!(f, "NACK"),
            Self::Release => write!(f, "RELEASE"),
            Self::Inform => write!(f, "INFORM"),
        }
    }
}

impl std::convert::TryFrom<u8> for DhcpV4MessageType {
    type Error = DhcpError;

    fn try_from(d: u8) -> Result<Self, DhcpError> {
        match d {
            d if d == Self::Discovery as u8 => Ok(Self::Discovery),
            d if d == Self::Offer as u8 => Ok(Self::Offer),
            d if d == Self::Request as u8 => Ok(Self::Request),
            d if d == Self::Decline as u8 => Ok(Self::Decline),
            d if d == Self::Ack as u8 => Ok(Self::Ack),
            d if d == Self::Nack as u8 => Ok(Self::Nack),
            d if d == Self::Release as u8 => Ok(Self::Release),
            d if d == Self::Inform as u8 => Ok(Self::Inform),
            _ => Err(DhcpError::new(
                ErrorKind::NotSupported,
                format!("DHCPv4 message type {d} is not supported"),
            )),
        }
    }
}

/// Outgoing DHCPv4 message. Fields the client never varies (op, htype,
/// hlen, hops, secs, flags, yiaddr, siaddr, giaddr) are fixed at emit time.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct DhcpV4Message {
    pub(crate) xid: u32,
    pub(crate) ciaddr: Ipv4Addr,
    pub(crate) chaddr: [u8; 6],
    pub(crate) options: DhcpV4SendOptions,
}

impl DhcpV4Message {
    pub(crate) fn new(
        xid: u32,
        ciaddr: Ipv4Addr,
        chaddr: [u8; 6],
        options: DhcpV4SendOptions,
    ) -> Self {
        Self {
            xid,
            ciaddr,
            chaddr,
            options,
        }
    }

    /// Serialize to a raw DHCP message, UDP payload only.
    pub(crate) fn to_dhcp_packet(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(MAX_DHCP_SEND_MSG_SIZE);
        raw.push(BOOTREQUEST);
        raw.push(ARP_HW_TYPE_ETHERNET);
        raw.push(HW_ADDR_LEN_ETHERNET);
        raw.push(0); // hops
        raw.extend_from_slice(&self.xid.to_be_bytes());
        raw.extend_from_slice(&0u16.to_be_bytes()); // secs
        raw.extend_from_slice(&0u16.to_be_bytes()); // flags
        raw.extend_from_slice(&self.ciaddr.octets());
        raw.extend_from_slice(&[0u8; 12]); // yiaddr, siaddr, giaddr
        raw.extend_from_slice(&self.chaddr);
        // chaddr padding, sname and file are all zero.
        raw.resize(MAGIC_OFFSET, 0);
        raw.extend_from_slice(&DHCPV4_MAGIC_COOKIE);
        self.options.emit(&mut raw);
        log::trace!("DHCP packet generated, {} bytes", raw.len());
        raw
    }
}

/// Incoming server reply, parsed from a raw DHCP message with UDP and
/// lower layer headers purged.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct DhcpV4Reply {
    pub(crate) op: u8,
    pub(crate) htype: u8,
    pub(crate) hlen: u8,
    pub(crate) hops: u8,
    pub(crate) xid: u32,
    pub(crate) secs: u16,
    pub(crate) flags: u16,
    pub(crate) ciaddr: Ipv4Addr,
    pub(crate) yiaddr: Ipv4Addr,
    pub(crate) siaddr: Ipv4Addr,
    pub(crate) giaddr: Ipv4Addr,
    pub(crate) chaddr: [u8; MAX_CHADDR_LEN],
    pub(crate) options: DhcpV4RecvOptions,
}

impl DhcpV4Reply {
    const MIN_LEN: usize = MAGIC_OFFSET + DHCPV4_MAGIC_COOKIE.len();

    pub(crate) fn parse(
        raw: &[u8],
        max_dns_servers: u8,
    ) -> Result<Self, DhcpError> {
        if raw.len() < Self::MIN_LEN {
            return Err(DhcpError::new(
                ErrorKind::InvalidDhcpMessage,
                format!(
                    "DHCP message length({}) is less than the minimum {}",
                    raw.len(),
                    Self::MIN_LEN
                ),
            ));
        }
        if raw[MAGIC_OFFSET..Self::MIN_LEN] != DHCPV4_MAGIC_COOKIE {
            return Err(DhcpError::new(
                ErrorKind::InvalidDhcpMessage,
                format!(
                    "Invalid DHCPv4 magic cookie, expected {:?}, got {:?}",
                    DHCPV4_MAGIC_COOKIE,
                    &raw[MAGIC_OFFSET..Self::MIN_LEN]
                ),
            ));
        }

        let options = DhcpV4RecvOptions::parse(
            &raw[Self::MIN_LEN..],
            &raw[SNAME_OFFSET..FILE_OFFSET],
            &raw[FILE_OFFSET..MAGIC_OFFSET],
            max_dns_servers,
        )?;

        let mut chaddr = [0u8; MAX_CHADDR_LEN];
        chaddr.copy_from_slice(&raw[CHADDR_OFFSET..SNAME_OFFSET]);

        let ret = Self {
            op: raw[0],
            htype: raw[1],
            hlen: raw[2],
            hops: raw[3],
            xid: read_u32_be(raw, XID_OFFSET),
            secs: read_u16_be(raw, SECS_OFFSET),
            flags: read_u16_be(raw, FLAGS_OFFSET),
            ciaddr: read_ipv4(raw, CIADDR_OFFSET),
            yiaddr: read_ipv4(raw, YIADDR_OFFSET),
            siaddr: read_ipv4(raw, SIADDR_OFFSET),
            giaddr: read_ipv4(raw, GIADDR_OFFSET),
            chaddr,
            options,
        };
        log::trace!("Parsed DHCP reply {ret:?}");
        Ok(ret)
    }

    /// First `hlen`-relevant bytes of `chaddr`, the client MAC on Ethernet.
    pub(crate) fn chaddr_mac(&self) -> [u8; 6] {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&self.chaddr[..6]);
        mac
    }
}
