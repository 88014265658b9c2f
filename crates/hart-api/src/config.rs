// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use hart_core::SnapshotShape;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3333;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address.
    pub listen: SocketAddr,
    /// Shape of the `/hart` document.
    pub snapshot: SnapshotShape,
}

impl ServerConfig {
    /// Creates a configuration listening on `listen`.
    pub fn new(listen: SocketAddr) -> Self {
        Self {
            listen,
            snapshot: SnapshotShape::default(),
        }
    }

    /// Sets the snapshot shape.
    pub fn with_snapshot(mut self, snapshot: SnapshotShape) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        self.listen
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::new(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            DEFAULT_PORT,
        ))
    }
}
