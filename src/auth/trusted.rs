// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted network matching.
//!
//! Requests whose client address falls inside one of the configured networks
//! skip token validation entirely. The set is parsed once at startup and is
//! read-only afterwards.

use std::net::IpAddr;

use ipnet::IpNet;
use tracing::warn;

/// Parsed set of trusted IP networks.
#[derive(Debug, Clone, Default)]
pub struct TrustedNetworks {
    networks: Vec<IpNet>,
}

impl TrustedNetworks {
    /// Parse configured entries.
    ///
    /// A bare address becomes a full-length prefix (/32 or /128), a CIDR is
    /// taken as-is. Entries that fail to parse are logged and skipped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let networks = entries
            .into_iter()
            .filter_map(|entry| {
                let entry = entry.as_ref().trim();
                match parse_entry(entry) {
                    Some(net) => Some(net),
                    None => {
                        warn!(entry = %entry, "Skipping unparsable trusted network entry");
                        None
                    }
                }
            })
            .collect();

        Self { networks }
    }

    /// Number of networks that parsed successfully.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Check whether the textual client address is trusted.
    ///
    /// Unparsable addresses are never trusted.
    pub fn contains(&self, address: &str) -> bool {
        self.match_address(address).is_some()
    }

    /// Parse the address and return it when it falls inside a trusted network.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`, as reported by a
    /// dual-stack listener) are returned in their IPv4 form.
    pub fn match_address(&self, address: &str) -> Option<IpAddr> {
        let ip = unmap(address.trim().parse::<IpAddr>().ok()?);
        self.contains_ip(ip).then_some(ip)
    }

    pub fn contains_ip(&self, ip: IpAddr) -> bool {
        let ip = unmap(ip);
        self.networks.iter().any(|net| net.contains(&ip))
    }
}

fn unmap(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    }
}

fn parse_entry(entry: &str) -> Option<IpNet> {
    if entry.contains('/') {
        entry.parse::<IpNet>().ok()
    } else {
        entry.parse::<IpAddr>().ok().map(IpNet::from)
    }
}
