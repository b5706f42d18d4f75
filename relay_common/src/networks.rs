//! CIDR network ranges and allow-lists.
//!
//! An [`IpNetwork`] is an address plus a prefix length, e.g. `185.71.76.0/27` or `2a02:5180::/32`. A bare address is
//! treated as a single-host range (`/32` for IPv4, `/128` for IPv6).
//!
//! [`TrustedNetworks`] is an ordered list of ranges. An address is trusted if any range contains it. IPv4-mapped IPv6
//! addresses (`::ffff:a.b.c.d`), which dual-stack listeners commonly report, are matched as their IPv4 equivalent.
use std::{
    fmt::Display,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkParseError {
    #[error("Invalid network address: {0}")]
    InvalidAddress(String),
    #[error("Invalid prefix length in {0}")]
    InvalidPrefix(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix_len: u8,
}

impl IpNetwork {
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self, NetworkParseError> {
        if prefix_len > max_prefix_len(&addr) {
            return Err(NetworkParseError::InvalidPrefix(format!("{addr}/{prefix_len}")));
        }
        Ok(Self { addr, prefix_len })
    }

    /// A range containing exactly one address.
    pub fn host(addr: IpAddr) -> Self {
        Self { addr, prefix_len: max_prefix_len(&addr) }
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true if `ip` lies inside this range. Addresses of the other IP family never match.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.addr, ip.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => prefix_matches(v4_bits(net), v4_bits(ip), self.prefix_len, 32),
            (IpAddr::V6(net), IpAddr::V6(ip)) => prefix_matches(v6_bits(net), v6_bits(ip), self.prefix_len, 128),
            _ => false,
        }
    }
}

fn max_prefix_len(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn v4_bits(ip: Ipv4Addr) -> u128 {
    u128::from(u32::from(ip))
}

fn v6_bits(ip: Ipv6Addr) -> u128 {
    u128::from(ip)
}

// `width` is the address width in bits; only the leading `prefix_len` bits are compared.
fn prefix_matches(net: u128, ip: u128, prefix_len: u8, width: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let shift = u32::from(width - prefix_len);
    (net >> shift) == (ip >> shift)
}

impl FromStr for IpNetwork {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            None => {
                let addr = IpAddr::from_str(s).map_err(|_| NetworkParseError::InvalidAddress(s.to_string()))?;
                Ok(Self::host(addr))
            },
            Some((addr, prefix)) => {
                let addr = IpAddr::from_str(addr).map_err(|_| NetworkParseError::InvalidAddress(s.to_string()))?;
                let prefix_len = prefix.parse::<u8>().map_err(|_| NetworkParseError::InvalidPrefix(s.to_string()))?;
                Self::new(addr, prefix_len)
            },
        }
    }
}

impl Display for IpNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

//--------------------------------------   TrustedNetworks   ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedNetworks {
    networks: Vec<IpNetwork>,
}

impl TrustedNetworks {
    pub fn new(networks: Vec<IpNetwork>) -> Self {
        Self { networks }
    }

    /// Parses a comma-separated list of ranges, e.g. `"185.71.76.0/27, 77.75.156.11, 2a02:5180::/32"`.
    /// Empty entries are skipped. The first invalid entry fails the whole list.
    pub fn from_list(list: &str) -> Result<Self, NetworkParseError> {
        let networks = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(IpNetwork::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { networks })
    }

    pub fn is_trusted_source(&self, ip: &IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(ip))
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }
}

impl Display for TrustedNetworks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let list = self.networks.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
        f.write_str(&list)
    }
}
