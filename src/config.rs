// SPDX-License-Identifier: Apache-2.0

use std::net::Ipv4Addr;

use crate::{DhcpError, ErrorKind};

// https://www.iana.org/assignments/arp-parameters/arp-parameters.xhtml#arp-parameters-2
const ARP_HW_TYPE_ETHERNET: u8 = 1;

const DEFAULT_MAX_DNS_SERVERS: u8 = 2;
const DEFAULT_MAX_CLIENT_ID_SIZE: u8 = 16;
const DEFAULT_MAX_VENDOR_CLASS_ID_SIZE: u8 = 16;
const DEFAULT_XID_REUSE_MAX: u8 = 3;
const DEFAULT_MAX_REQUESTS: u8 = 3;
const DEFAULT_MAX_REBOOT_REQUESTS: u8 = 2;
const DEFAULT_BASE_RTX_TIMEOUT: u8 = 3;
const DEFAULT_MAX_RTX_TIMEOUT: u8 = 64;
const DEFAULT_RESET_TIMEOUT: u8 = 3;
const DEFAULT_MIN_RENEW_RTX_TIMEOUT: u8 = 60;
const DEFAULT_ARP_RESPONSE_TIMEOUT: u8 = 1;
const DEFAULT_NUM_ARP_QUERIES: u8 = 2;
const DEFAULT_TTL: u8 = 64;

/// DHCPv4 client configuration.
///
/// All timing knobs are in whole seconds. The defaults are suitable for
/// most deployments; out-of-range values are rejected when the client is
/// created.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DhcpV4Config {
    pub(crate) client_id: Vec<u8>,
    pub(crate) vendor_class_id: Vec<u8>,
    pub(crate) request_ip: Option<Ipv4Addr>,
    pub(crate) max_client_id_size: u8,
    pub(crate) max_vendor_class_id_size: u8,
    pub(crate) max_dns_servers: u8,
    pub(crate) xid_reuse_max: u8,
    pub(crate) max_requests: u8,
    pub(crate) max_reboot_requests: u8,
    pub(crate) base_rtx_timeout: u8,
    pub(crate) max_rtx_timeout: u8,
    pub(crate) reset_timeout: u8,
    pub(crate) min_renew_rtx_timeout: u8,
    pub(crate) arp_response_timeout: u8,
    pub(crate) num_arp_queries: u8,
    pub(crate) ttl: u8,
    pub(crate) random_xid: bool,
}

impl Default for DhcpV4Config {
    fn default() -> Self {
        Self {
            client_id: Vec::new(),
            vendor_class_id: Vec::new(),
            request_ip: None,
            max_client_id_size: DEFAULT_MAX_CLIENT_ID_SIZE,
            max_vendor_class_id_size: DEFAULT_MAX_VENDOR_CLASS_ID_SIZE,
            max_dns_servers: DEFAULT_MAX_DNS_SERVERS,
            xid_reuse_max: DEFAULT_XID_REUSE_MAX,
            max_requests: DEFAULT_MAX_REQUESTS,
            max_reboot_requests: DEFAULT_MAX_REBOOT_REQUESTS,
            base_rtx_timeout: DEFAULT_BASE_RTX_TIMEOUT,
            max_rtx_timeout: DEFAULT_MAX_RTX_TIMEOUT,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
            min_renew_rtx_timeout: DEFAULT_MIN_RENEW_RTX_TIMEOUT,
            arp_response_timeout: DEFAULT_ARP_RESPONSE_TIMEOUT,
            num_arp_queries: DEFAULT_NUM_ARP_QUERIES,
            ttl: DEFAULT_TTL,
            random_xid: false,
        }
    }
}

impl DhcpV4Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address to request via the rebooting state instead of starting with
    /// discovery.
    pub fn set_request_ip(&mut self, ip: Ipv4Addr) -> &mut Self {
        self.request_ip = Some(ip);
        self
    }

    pub fn set_client_id(
        &mut self,
        client_id_type: u8,
        client_id: &[u8],
    ) -> &mut Self {
        // RFC 2132: 9.14. Client-identifier
        self.client_id = vec![client_id_type];
        self.client_id.extend_from_slice(client_id);
        self
    }

    pub fn use_mac_as_client_id(&mut self, mac: [u8; 6]) -> &mut Self {
        self.set_client_id(ARP_HW_TYPE_ETHERNET, &mac)
    }

    pub fn set_vendor_class_id(&mut self, vendor_class_id: &[u8]) -> &mut Self {
        self.vendor_class_id = vendor_class_id.to_vec();
        self
    }

    /// Generate transaction IDs from a random source instead of the low
    /// bits of the monotonic clock.
    pub fn set_random_xid(&mut self, enabled: bool) -> &mut Self {
        self.random_xid = enabled;
        self
    }

    pub fn set_max_dns_servers(&mut self, count: u8) -> &mut Self {
        self.max_dns_servers = count;
        self
    }

    pub fn set_xid_reuse_max(&mut self, count: u8) -> &mut Self {
        self.xid_reuse_max = count;
        self
    }

    pub fn set_max_requests(&mut self, count: u8) -> &mut Self {
        self.max_requests = count;
        self
    }

    pub fn set_max_reboot_requests(&mut self, count: u8) -> &mut Self {
        self.max_reboot_requests = count;
        self
    }

    pub fn set_base_rtx_timeout(&mut self, seconds: u8) -> &mut Self {
        self.base_rtx_timeout = seconds;
        self
    }

    pub fn set_max_rtx_timeout(&mut self, seconds: u8) -> &mut Self {
        self.max_rtx_timeout = seconds;
        self
    }

    pub fn set_reset_timeout(&mut self, seconds: u8) -> &mut Self {
        self.reset_timeout = seconds;
        self
    }

    pub fn set_min_renew_rtx_timeout(&mut self, seconds: u8) -> &mut Self {
        self.min_renew_rtx_timeout = seconds;
        self
    }

    pub fn set_arp_response_timeout(&mut self, seconds: u8) -> &mut Self {
        self.arp_response_timeout = seconds;
        self
    }

    pub fn set_num_arp_queries(&mut self, count: u8) -> &mut Self {
        self.num_arp_queries = count;
        self
    }

    pub fn set_ttl(&mut self, ttl: u8) -> &mut Self {
        self.ttl = ttl;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), DhcpError> {
        check_bounds("max_dns_servers", self.max_dns_servers, 1, 31)?;
        check_bounds("xid_reuse_max", self.xid_reuse_max, 1, 5)?;
        check_bounds("max_requests", self.max_requests, 1, 5)?;
        check_bounds("max_reboot_requests", self.max_reboot_requests, 1, 5)?;
        check_bounds("base_rtx_timeout", self.base_rtx_timeout, 1, 4)?;
        check_bounds(
            "max_rtx_timeout",
            self.max_rtx_timeout,
            self.base_rtx_timeout,
            u8::MAX,
        )?;
        check_bounds("reset_timeout", self.reset_timeout, 1, 128)?;
        check_bounds(
            "min_renew_rtx_timeout",
            self.min_renew_rtx_timeout,
            10,
            u8::MAX,
        )?;
        check_bounds(
            "arp_response_timeout",
            self.arp_response_timeout,
            1,
            5,
        )?;
        check_bounds("num_arp_queries", self.num_arp_queries, 1, 10)?;
        if self.client_id.len() > usize::from(self.max_client_id_size) {
            return Err(DhcpError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Client identifier length {} exceeded the maximum {}",
                    self.client_id.len(),
                    self.max_client_id_size
                ),
            ));
        }
        if self.vendor_class_id.len() > usize::from(self.max_vendor_class_id_size)
        {
            return Err(DhcpError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Vendor class identifier length {} exceeded the \
                     maximum {}",
                    self.vendor_class_id.len(),
                    self.max_vendor_class_id_size
                ),
            ));
        }
        if let Some(ip) = self.request_ip {
            if ip.is_unspecified() {
                return Err(DhcpError::new(
                    ErrorKind::InvalidArgument,
                    "Requested IP address cannot be 0.0.0.0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn check_bounds(
    name: &str,
    value: u8,
    min: u8,
    max: u8,
) -> Result<(), DhcpError> {
    if value < min || value > max {
        return Err(DhcpError::new(
            ErrorKind::InvalidArgument,
            format!("{name} must be within {min}..={max}, got {value}"),
        ));
    }
    Ok(())
}
