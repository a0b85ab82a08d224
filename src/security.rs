use crate::SummaryError;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use url::Url;

/// Returns true when the address falls in a non-routable or reserved prefix
/// from the IANA special-purpose registries for either address family.
pub fn is_blocked_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_ipv4(v4),
        IpAddr::V6(v6) => is_blocked_ipv6(v6),
    }
}

fn is_blocked_ipv4(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();

    // 0.0.0.0/8 "this network"
    octets[0] == 0
        // 127.0.0.0/8 loopback
        || ip.is_loopback()
        // 10.0.0.0/8
        || octets[0] == 10
        // 100.64.0.0/10 carrier-grade NAT
        || (octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000)
        // 169.254.0.0/16 link-local
        || (octets[0] == 169 && octets[1] == 254)
        // 172.16.0.0/12
        || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        // 192.0.0.0/24 IETF protocol assignments (PCP/TURN anycast, NAT64 discovery)
        || (octets[0] == 192 && octets[1] == 0 && octets[2] == 0)
        // 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24 documentation TEST-NETs
        || (octets[0] == 192 && octets[1] == 0 && octets[2] == 2)
        || (octets[0] == 198 && octets[1] == 51 && octets[2] == 100)
        || (octets[0] == 203 && octets[1] == 0 && octets[2] == 113)
        // 192.168.0.0/16
        || (octets[0] == 192 && octets[1] == 168)
        // 198.18.0.0/15 benchmarking
        || (octets[0] == 198 && (octets[1] & 0b1111_1110) == 18)
        // 224.0.0.0/4 multicast
        || (octets[0] & 0b1111_0000) == 0b1110_0000
        // 240.0.0.0/4 reserved, includes 255.255.255.255 limited broadcast
        || (octets[0] & 0b1111_0000) == 0b1111_0000
}

fn is_blocked_ipv6(ip: &Ipv6Addr) -> bool {
    // ::ffff:0:0/96 IPv4-mapped, never a legitimate dial target
    if ip.to_ipv4_mapped().is_some() {
        return true;
    }

    let segments = ip.segments();

    // ::1/128 loopback, ::/128 unspecified
    ip.is_loopback()
        || ip.is_unspecified()
        // 64:ff9b::/96 NAT64, 64:ff9b:1::/48 local-use translation
        || (segments[0] == 0x64 && segments[1] == 0xff9b && segments[2] <= 1)
        // 100::/64 discard-only
        || (segments[0] == 0x100 && segments[1] == 0 && segments[2] == 0 && segments[3] == 0)
        // 2001::/23 IETF protocol assignments (Teredo, benchmarking, AMT, ORCHID)
        || (segments[0] == 0x2001 && segments[1] < 0x0200)
        // 2001:db8::/32 documentation
        || (segments[0] == 0x2001 && segments[1] == 0xdb8)
        // 3fff::/20 documentation
        || (segments[0] == 0x3fff && (segments[1] & 0xf000) == 0)
        // 5f00::/16 SRv6 SIDs
        || segments[0] == 0x5f00
        // fc00::/7 unique-local
        || (segments[0] & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (segments[0] & 0xffc0) == 0xfe80
        // ff00::/8 multicast
        || (segments[0] & 0xff00) == 0xff00
}

/// DNS resolver plugged into the HTTP client so address filtering happens at
/// dial time: the addresses that pass the screen are exactly the addresses
/// the connector dials. A rebinding answer between a pre-flight check and
/// the connection therefore cannot reach blocked space.
pub(crate) struct ScreeningResolver;

impl Resolve for ScreeningResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let addrs = resolve_screened(name.as_str()).await?;
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

async fn resolve_screened(
    host: &str,
) -> Result<Vec<SocketAddr>, Box<dyn std::error::Error + Send + Sync>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0u16)).await?.collect();
    if let Some(blocked) = addrs.iter().find(|addr| is_blocked_ip(&addr.ip())) {
        return Err(format!("address blocked: {}", blocked.ip()).into());
    }
    Ok(addrs)
}

/// Rejects a target whose host resolves to any blocked address.
///
/// Literal IP hosts are checked directly; domain hosts are resolved and every
/// returned address must be routable. With `allow_private` set no filtering
/// happens at all (test mode).
pub async fn ensure_public_host(url: &Url, allow_private: bool) -> Result<(), SummaryError> {
    if allow_private {
        return Ok(());
    }

    let host = url
        .host()
        .ok_or_else(|| SummaryError::FetchError("no host in URL".into()))?;

    match host {
        url::Host::Ipv4(ip) => {
            if is_blocked_ipv4(&ip) {
                return Err(SummaryError::AddressBlocked(ip.to_string()));
            }
        }
        url::Host::Ipv6(ip) => {
            if is_blocked_ipv6(&ip) {
                return Err(SummaryError::AddressBlocked(ip.to_string()));
            }
        }
        url::Host::Domain(domain) => {
            let port = url
                .port()
                .unwrap_or(if url.scheme() == "https" { 443 } else { 80 });
            let addrs = tokio::net::lookup_host((domain, port))
                .await
                .map_err(|e| SummaryError::FetchError(format!("DNS lookup failed: {e}")))?;
            for addr in addrs {
                if is_blocked_ip(&addr.ip()) {
                    return Err(SummaryError::AddressBlocked(addr.ip().to_string()));
                }
            }
        }
    }

    Ok(())
}
