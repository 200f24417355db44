//! CIDR expansion into probe targets.

use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{DiscoverError, Result};

/// Expand a CIDR block into its host addresses, ascending.
///
/// Host bits in the address part are ignored (`10.0.0.7/24` is `10.0.0.0/24`)
/// and a bare address is treated as a single-host block. IPv4 blocks larger
/// than /31 exclude their network and broadcast addresses; /31 and /32 are
/// returned verbatim. At most `max_hosts` addresses are returned.
pub fn expand(cidr: &str, max_hosts: usize) -> Result<Vec<IpAddr>> {
    let net = parse(cidr)?;
    let total = host_count(&net);

    let hosts: Vec<IpAddr> = net.hosts().take(max_hosts).collect();

    if total > hosts.len() as u128 {
        tracing::warn!(
            cidr = %net,
            total_hosts = %total,
            max_hosts,
            "CIDR block exceeds host ceiling, truncating"
        );
    }

    Ok(hosts)
}

/// Parse a CIDR string (or bare address) into its normalized network.
pub fn parse(cidr: &str) -> Result<IpNet> {
    let raw = cidr.trim();
    if raw.is_empty() {
        return Err(invalid(cidr, "empty target"));
    }

    if let Ok(net) = raw.parse::<IpNet>() {
        return Ok(net.trunc());
    }

    raw.parse::<IpAddr>()
        .map(IpNet::from)
        .map_err(|_| invalid(cidr, "expected address/prefix, e.g. 192.168.1.0/24"))
}

/// Number of addresses `IpNet::hosts` yields for this block.
fn host_count(net: &IpNet) -> u128 {
    let bits = u32::from(net.max_prefix_len() - net.prefix_len());
    let size = if bits >= 128 { u128::MAX } else { 1u128 << bits };
    match net {
        IpNet::V4(_) if bits > 1 => size - 2,
        _ => size,
    }
}

fn invalid(cidr: &str, reason: &str) -> DiscoverError {
    DiscoverError::InvalidCidr {
        cidr: cidr.to_string(),
        reason: reason.to_string(),
    }
}
