//! Broker address parsing: `scheme://host[:port]`

use serde::Serialize;
use std::fmt;

use crate::ContractError;

pub const MQTT_PLAIN_PORT: u16 = 1883;
pub const MQTT_TLS_PORT: u16 = 8883;

/// Resolved broker endpoint.
///
/// Schemes `tcp` and `mqtt` are plain, `ssl` and `mqtts` use TLS. A missing
/// scheme means plain. The port defaults to 1883 (plain) or 8883 (TLS).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl BrokerAddress {
    pub fn parse(url: &str) -> Result<Self, ContractError> {
        let url = url.trim();
        let (tls, rest) = match url.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "tcp" | "mqtt" => (false, rest),
                "ssl" | "mqtts" => (true, rest),
                other => {
                    return Err(invalid(url, format!("unsupported scheme '{other}'")));
                }
            },
            None => (false, url),
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = split_host_port(rest).map_err(|msg| invalid(url, msg))?;

        if host.is_empty() {
            return Err(invalid(url, "missing host".to_string()));
        }

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| invalid(url, format!("invalid port '{p}'")))?,
            None if tls => MQTT_TLS_PORT,
            None => MQTT_PLAIN_PORT,
        };

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "ssl" } else { "tcp" };
        if self.host.contains(':') {
            write!(f, "{scheme}://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{scheme}://{}:{}", self.host, self.port)
        }
    }
}

fn split_host_port(authority: &str) -> Result<(&str, Option<&str>), String> {
    // Bracketed IPv6 literal
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| "unterminated '[' in host".to_string())?;
        return match after {
            "" => Ok((host, None)),
            _ => after
                .strip_prefix(':')
                .map(|port| (host, Some(port)))
                .ok_or_else(|| format!("unexpected '{after}' after host")),
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => Ok((host, Some(port))),
        None => Ok((authority, None)),
    }
}

fn invalid(url: &str, message: String) -> ContractError {
    ContractError::config_validation("sink.broker", format!("'{url}': {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_by_scheme() {
        let plain = BrokerAddress::parse("tcp://localhost").unwrap();
        assert_eq!((plain.host.as_str(), plain.port, plain.tls), ("localhost", 1883, false));

        let tls = BrokerAddress::parse("ssl://broker.example.com").unwrap();
        assert_eq!((tls.port, tls.tls), (8883, true));
    }

    #[test]
    fn test_explicit_port_and_bare_host() {
        let addr = BrokerAddress::parse("mqtts://10.0.0.5:9001").unwrap();
        assert_eq!(addr.port, 9001);
        assert!(addr.tls);

        let bare = BrokerAddress::parse("localhost:1884").unwrap();
        assert_eq!(bare.port, 1884);
        assert!(!bare.tls);
    }

    #[test]
    fn test_ipv6_literal() {
        let addr = BrokerAddress::parse("tcp://[::1]:1883").unwrap();
        assert_eq!(addr.host, "::1");
        assert_eq!(addr.to_string(), "tcp://[::1]:1883");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(BrokerAddress::parse("http://localhost").is_err());
        assert!(BrokerAddress::parse("tcp://localhost:port").is_err());
        assert!(BrokerAddress::parse("tcp://localhost:0").is_err());
        assert!(BrokerAddress::parse("tcp://:1883").is_err());
        assert!(BrokerAddress::parse("tcp://[::1").is_err());
    }
}
