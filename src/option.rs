// SPDX-License-Identifier: Apache-2.0

use std::net::Ipv4Addr;

use crate::{
    msg::DhcpV4MessageType, DhcpError, ErrorContext, ErrorKind,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub(crate) enum DhcpV4OptionCode {
    Pad = 0,
    SubnetMask = 1,
    Router = 3,
    DomainNameServer = 6,
    RequestedIpAddress = 50,
    IpAddressLeaseTime = 51,
    OptionOverload = 52,
    MessageType = 53,
    ServerIdentifier = 54,
    ParameterRequestList = 55,
    Message = 56,
    MaxDhcpMessageSize = 57,
    RenewalTime = 58,
    RebindingTime = 59,
    VendorClassIdentifier = 60,
    ClientIdentifier = 61,
    End = 255,
}

// RFC 2132: 9.3. Option Overload
const OVERLOAD_FILE: u8 = 1;
const OVERLOAD_SNAME: u8 = 2;

// Options requested from the server via option 55, in this order.
const PARAMETER_REQUEST_LIST: [u8; 6] = [
    DhcpV4OptionCode::SubnetMask as u8,
    DhcpV4OptionCode::Router as u8,
    DhcpV4OptionCode::DomainNameServer as u8,
    DhcpV4OptionCode::IpAddressLeaseTime as u8,
    DhcpV4OptionCode::RenewalTime as u8,
    DhcpV4OptionCode::RebindingTime as u8,
];

/// Options consumed from server replies. `None` means the option was
/// absent. Options outside the consumed set are skipped.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub(crate) struct DhcpV4RecvOptions {
    pub(crate) message_type: Option<DhcpV4MessageType>,
    pub(crate) server_identifier: Option<Ipv4Addr>,
    pub(crate) lease_time_sec: Option<u32>,
    pub(crate) renewal_time_sec: Option<u32>,
    pub(crate) rebinding_time_sec: Option<u32>,
    pub(crate) subnet_mask: Option<Ipv4Addr>,
    pub(crate) router: Option<Ipv4Addr>,
    pub(crate) dns_servers: Vec<Ipv4Addr>,
}

impl DhcpV4RecvOptions {
    /// Parse the option area of a received message. When option 52 is
    /// present the `file` and/or `sname` header fields hold further
    /// options and are parsed as well.
    pub(crate) fn parse(
        options_area: &[u8],
        sname: &[u8],
        file: &[u8],
        max_dns_servers: u8,
    ) -> Result<Self, DhcpError> {
        let mut ret = Self::default();
        let overload = ret
            .parse_area(options_area, max_dns_servers, true)
            .context("Invalid DHCPv4 option area")?;
        if let Some(overload) = overload {
            if overload & OVERLOAD_FILE != 0 {
                ret.parse_area(file, max_dns_servers, false)
                    .context("Invalid DHCPv4 options in 'file' field")?;
            }
            if overload & OVERLOAD_SNAME != 0 {
                ret.parse_area(sname, max_dns_servers, false)
                    .context("Invalid DHCPv4 options in 'sname' field")?;
            }
        }
        Ok(ret)
    }

    // A nested overload option is only honored in the real option area,
    // not within the overloaded header fields.
    fn parse_area(
        &mut self,
        data: &[u8],
        max_dns_servers: u8,
        allow_overload: bool,
    ) -> Result<Option<u8>, DhcpError> {
        let mut overload = None;
        let mut pos = 0;
        while pos < data.len() {
            let code = data[pos];
            pos += 1;
            if code == DhcpV4OptionCode::Pad as u8 {
                continue;
            }
            if code == DhcpV4OptionCode::End as u8 {
                break;
            }
            let len = usize::from(*data.get(pos).ok_or_else(|| {
                DhcpError::new(
                    ErrorKind::InvalidDhcpMessage,
                    format!("DHCP option {code} is missing its length byte"),
                )
            })?);
            pos += 1;
            let payload = data.get(pos..pos + len).ok_or_else(|| {
                DhcpError::new(
                    ErrorKind::InvalidDhcpMessage,
                    format!("DHCP option {code} data is truncated"),
                )
            })?;
            pos += len;
            match code {
                c if c == DhcpV4OptionCode::MessageType as u8 => {
                    if len != 1 {
                        return Err(invalid_len("message type", len));
                    }
                    match DhcpV4MessageType::try_from(payload[0]) {
                        Ok(t) => self.message_type = Some(t),
                        Err(_) => {
                            log::debug!(
                                "Ignoring unknown DHCP message type {}",
                                payload[0]
                            );
                        }
                    }
                }
                c if c == DhcpV4OptionCode::ServerIdentifier as u8 => {
                    self.server_identifier =
                        Some(parse_ipv4("server identifier", payload)?);
                }
                c if c == DhcpV4OptionCode::SubnetMask as u8 => {
                    self.subnet_mask =
                        Some(parse_ipv4("subnet mask", payload)?);
                }
                c if c == DhcpV4OptionCode::Router as u8 => {
                    // The option may carry a list of routers; only the
                    // first (preferred) one is used.
                    if len < 4 || len % 4 != 0 {
                        return Err(invalid_len("router", len));
                    }
                    self.router = Some(parse_ipv4("router", &payload[..4])?);
                }
                c if c == DhcpV4OptionCode::DomainNameServer as u8 => {
                    if len < 4 || len % 4 != 0 {
                        return Err(invalid_len("domain name server", len));
                    }
                    for chunk in payload.chunks_exact(4) {
                        if self.dns_servers.len()
                            >= usize::from(max_dns_servers)
                        {
                            log::debug!(
                                "Ignoring DNS servers beyond the first {}",
                                max_dns_servers
                            );
                            break;
                        }
                        self.dns_servers
                            .push(parse_ipv4("domain name server", chunk)?);
                    }
                }
                c if c == DhcpV4OptionCode::IpAddressLeaseTime as u8 => {
                    self.lease_time_sec =
                        Some(parse_u32("lease time", payload)?);
                }
                c if c == DhcpV4OptionCode::RenewalTime as u8 => {
                    self.renewal_time_sec =
                        Some(parse_u32("renewal time", payload)?);
                }
                c if c == DhcpV4OptionCode::RebindingTime as u8 => {
                    self.rebinding_time_sec =
                        Some(parse_u32("rebinding time", payload)?);
                }
                c if c == DhcpV4OptionCode::OptionOverload as u8 => {
                    if len != 1 {
                        return Err(invalid_len("option overload", len));
                    }
                    if allow_overload {
                        overload = Some(payload[0]);
                    }
                }
                _ => {
                    log::trace!("Skipping DHCP option {code} length {len}");
                }
            }
        }
        Ok(overload)
    }
}

fn invalid_len(name: &str, len: usize) -> DhcpError {
    DhcpError::new(
        ErrorKind::InvalidDhcpMessage,
        format!("DHCP {name} option has invalid length {len}"),
    )
}

fn parse_ipv4(name: &str, payload: &[u8]) -> Result<Ipv4Addr, DhcpError> {
    if payload.len() != 4 {
        return Err(invalid_len(name, payload.len()));
    }
    Ok(Ipv4Addr::new(payload[0], payload[1], payload[2], payload[3]))
}

fn parse_u32(name: &str, payload: &[u8]) -> Result<u32, DhcpError> {
    if payload.len() != 4 {
        return Err(invalid_len(name, payload.len()));
    }
    Ok(u32::from_be_bytes([
        payload[0], payload[1], payload[2], payload[3],
    ]))
}

/// Options attached to an outgoing message. Empty byte vectors and `None`
/// fields are not emitted.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub(crate) struct DhcpV4SendOptions {
    pub(crate) message_type: DhcpV4MessageType,
    pub(crate) server_identifier: Option<Ipv4Addr>,
    pub(crate) requested_ip_address: Option<Ipv4Addr>,
    pub(crate) client_id: Vec<u8>,
    pub(crate) vendor_class_id: Vec<u8>,
    pub(crate) message: Option<String>,
    pub(crate) parameter_request_list: bool,
    pub(crate) max_message_size: Option<u16>,
}

impl DhcpV4SendOptions {
    pub(crate) fn new(message_type: DhcpV4MessageType) -> Self {
        Self {
            message_type,
            ..Default::default()
        }
    }

    pub(crate) fn emit(&self, raw: &mut Vec<u8>) {
        raw.extend_from_slice(&[
            DhcpV4OptionCode::MessageType as u8,
            1,
            self.message_type as u8,
        ]);
        if let Some(ip) = self.requested_ip_address {
            raw.extend_from_slice(&[
                DhcpV4OptionCode::RequestedIpAddress as u8,
                4,
            ]);
            raw.extend_from_slice(&ip.octets());
        }
        if let Some(ip) = self.server_identifier {
            raw.extend_from_slice(&[
                DhcpV4OptionCode::ServerIdentifier as u8,
                4,
            ]);
            raw.extend_from_slice(&ip.octets());
        }
        if self.parameter_request_list {
            raw.extend_from_slice(&[
                DhcpV4OptionCode::ParameterRequestList as u8,
                PARAMETER_REQUEST_LIST.len() as u8,
            ]);
            raw.extend_from_slice(&PARAMETER_REQUEST_LIST);
        }
        if let Some(size) = self.max_message_size {
            raw.extend_from_slice(&[
                DhcpV4OptionCode::MaxDhcpMessageSize as u8,
                2,
            ]);
            raw.extend_from_slice(&size.to_be_bytes());
        }
        if !self.vendor_class_id.is_empty() {
            raw.extend_from_slice(&[
                DhcpV4OptionCode::VendorClassIdentifier as u8,
                self.vendor_class_id.len() as u8,
            ]);
            raw.extend_from_slice(&self.vendor_class_id);
        }
        if !self.client_id.is_empty() {
            raw.extend_from_slice(&[
                DhcpV4OptionCode::ClientIdentifier as u8,
                self.client_id.len() as u8,
            ]);
            raw.extend_from_slice(&self.client_id);
        }
        if let Some(message) = self.message.as_deref() {
            raw.extend_from_slice(&[
                DhcpV4OptionCode::Message as u8,
                message.len() as u8,
            ]);
            raw.extend_from_slice(message.as_bytes());
        }
        raw.push(DhcpV4OptionCode::End as u8);
    }
}
