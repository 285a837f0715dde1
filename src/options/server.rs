//! Server engine option derivation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::schema::DyteConfig;

/// Options handed to the server engine for one server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerOptions {
    /// Hostname used in the serving URL.
    pub hostname: String,
    pub port: u16,
    /// Socket address the listener binds.
    pub bind_addr: SocketAddr,
    pub root: PathBuf,
    pub public_dir: PathBuf,
    pub tls: Option<TlsPaths>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl ServerOptions {
    /// Serving URL for the configured port.
    pub fn url(&self) -> String {
        self.url_for_port(self.port)
    }

    /// Serving URL for an actual bound port (differs when `port` is 0).
    pub fn url_for_port(&self, port: u16) -> String {
        match self.hostname.parse::<IpAddr>() {
            Ok(ip) => format!("http://{}", SocketAddr::new(ip, port)),
            Err(_) => format!("http://{}:{}", self.hostname, port),
        }
    }
}

/// Derive server engine options, resolving relative paths against `cwd`.
pub fn derive_server_options(config: &DyteConfig, cwd: &Path) -> ServerOptions {
    let root = absolutize(cwd, &config.root);
    let hostname = config.server.hostname.clone();
    let ip = bind_ip(&hostname);

    ServerOptions {
        port: config.server.port,
        bind_addr: SocketAddr::new(ip, config.server.port),
        public_dir: absolutize(&root, &config.public_dir),
        tls: config.server.tls.pair().map(|(cert, key)| TlsPaths {
            cert: absolutize(cwd, cert),
            key: absolutize(cwd, key),
        }),
        hostname,
        root,
    }
}

/// `localhost` binds the IPv4 loopback; validated configs carry an IP otherwise.
fn bind_ip(hostname: &str) -> IpAddr {
    hostname
        .parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serves_localhost_3000() {
        let config = DyteConfig::default();
        let options = derive_server_options(&config, Path::new("/work"));

        assert_eq!(options.port, 3000);
        assert_eq!(options.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(options.url(), "http://localhost:3000");
        assert_eq!(options.root, PathBuf::from("/work/."));
        assert!(options.tls.is_none());
    }

    #[test]
    fn derivation_is_deterministic() {
        let mut config = DyteConfig::default();
        config.server.port = 4000;

        let a = derive_server_options(&config, Path::new("/work"));
        let b = derive_server_options(&config, Path::new("/work"));
        assert_eq!(a, b);
        assert_eq!(a.port, 4000);
    }

    #[test]
    fn tls_only_when_paired() {
        let mut config = DyteConfig::default();
        config.server.tls.cert = Some(PathBuf::from("certs/cert.pem"));
        assert!(derive_server_options(&config, Path::new("/work")).tls.is_none());

        config.server.tls.key = Some(PathBuf::from("/etc/key.pem"));
        let tls = derive_server_options(&config, Path::new("/work")).tls.unwrap();
        assert_eq!(tls.cert, PathBuf::from("/work/certs/cert.pem"));
        assert_eq!(tls.key, PathBuf::from("/etc/key.pem"));
    }

    #[test]
    fn ip_hostname_is_bound_directly() {
        let mut config = DyteConfig::default();
        config.server.hostname = "0.0.0.0".into();
        config.server.port = 8080;

        let options = derive_server_options(&config, Path::new("/work"));
        assert_eq!(options.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(options.url_for_port(9090), "http://0.0.0.0:9090");
    }

    #[test]
    fn ipv6_hostname_is_bracketed_in_url() {
        let mut config = DyteConfig::default();
        config.server.hostname = "::1".into();

        let options = derive_server_options(&config, Path::new("/work"));
        assert_eq!(options.bind_addr, "[::1]:3000".parse().unwrap());
        assert_eq!(options.url(), "http://[::1]:3000");
    }
}
