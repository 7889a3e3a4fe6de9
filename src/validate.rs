// SPDX-License-Identifier: Apache-2.0

use std::net::Ipv4Addr;

use crate::option::DhcpV4RecvOptions;

/// Lease timing and addressing data distilled from an acknowledgement
/// after validation, with missing fields filled in.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct AckFixup {
    pub(crate) lease_time_sec: u32,
    pub(crate) renewal_time_sec: u32,
    pub(crate) rebinding_time_sec: u32,
    pub(crate) subnet_mask: Ipv4Addr,
    pub(crate) router: Option<Ipv4Addr>,
}

/// Sanity check an offered (or acknowledged) address. Zero, limited
/// broadcast, loopback and multicast addresses are never acceptable
/// assignments.
pub(crate) fn check_offered_addr(addr: Ipv4Addr) -> bool {
    if addr.is_unspecified() || addr.is_broadcast() {
        return false;
    }
    if addr.is_loopback() {
        return false;
    }
    if addr.is_multicast() {
        return false;
    }
    true
}

// RFC 2132 did not make the subnet mask mandatory, so fall back to the
// address class when it is absent. Class D/E targets are rejected.
fn classful_mask(addr: Ipv4Addr) -> Option<Ipv4Addr> {
    let leading = addr.octets()[0];
    if leading < 128 {
        Some(Ipv4Addr::new(255, 0, 0, 0))
    } else if leading < 192 {
        Some(Ipv4Addr::new(255, 255, 0, 0))
    } else if leading < 224 {
        Some(Ipv4Addr::new(255, 255, 255, 0))
    } else {
        None
    }
}

fn is_contiguous_mask(mask: Ipv4Addr) -> bool {
    let raw = u32::from(mask);
    raw.leading_ones() + raw.trailing_zeros() == 32
}

/// Validate an acknowledgement and fill in what the server left out.
///
/// Returns `None` when the message must be dropped. Otherwise the result
/// satisfies `renewal_time_sec <= rebinding_time_sec <= lease_time_sec`
/// and carries a well-formed subnet mask; a router outside the leased
/// subnet is silently discarded.
pub(crate) fn check_and_fixup_ack(
    addr: Ipv4Addr,
    opts: &DhcpV4RecvOptions,
) -> Option<AckFixup> {
    if !check_offered_addr(addr) {
        return None;
    }

    let lease_time_sec = match opts.lease_time_sec {
        Some(t) => t,
        None => {
            log::debug!("Dropping DHCPACK without a lease time");
            return None;
        }
    };

    let subnet_mask = match opts.subnet_mask {
        Some(mask) => mask,
        None => match classful_mask(addr) {
            Some(mask) => {
                log::debug!(
                    "DHCPACK has no subnet mask, assuming classful {mask}"
                );
                mask
            }
            None => return None,
        },
    };

    if !is_contiguous_mask(subnet_mask) {
        log::debug!("Dropping DHCPACK with non-contiguous mask {subnet_mask}");
        return None;
    }

    // The leased address must not be the directed broadcast of its own
    // subnet.
    let local_broadcast = Ipv4Addr::from(
        (u32::from(addr) & u32::from(subnet_mask)) | !u32::from(subnet_mask),
    );
    if addr == local_broadcast {
        return None;
    }

    let router = match opts.router {
        Some(router)
            if u32::from(router) & u32::from(subnet_mask)
                != u32::from(addr) & u32::from(subnet_mask) =>
        {
            log::debug!(
                "Ignoring router {router} outside of the leased subnet"
            );
            None
        }
        other => other,
    };

    let renewal_time_sec = opts
        .renewal_time_sec
        .unwrap_or(lease_time_sec / 2)
        .min(lease_time_sec);

    let rebinding_time_sec = opts
        .rebinding_time_sec
        .unwrap_or_else(|| (u64::from(lease_time_sec) * 7 / 8) as u32)
        .min(lease_time_sec)
        .max(renewal_time_sec);

    Some(AckFixup {
        lease_time_sec,
        renewal_time_sec,
        rebinding_time_sec,
        subnet_mask,
        router,
    })
}
