//! Route classification
//!
//! The route between two chains is decided purely from their descriptor
//! variants:
//!
//! | from \ to         | Hub    | Direct                  | Indirect          |
//! |-------------------|--------|-------------------------|-------------------|
//! | Hub               | -      | FromHub                 | FromHub           |
//! | Direct            | ToHub  | DirectHubDirect         | DirectHubIndirect |
//! | Indirect (relay)  | ToHub  | IndirectHubDirect       | unsupported       |
//! | Indirect (eibc)   | ToHub  | IncentivizedHubDirect   | unsupported       |

use serde::{Deserialize, Serialize};

use bridge_core::{BridgeError, Chain, ChainDescriptor, Result, Settlement};

/// Whether the Hub forwards the transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteMode {
    Direct,
    ViaHub,
}

/// Kind of a two-hop route, by its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteKind {
    DirectHubDirect,
    /// Hub relays onward; the destination leg carries no gas payment
    DirectHubIndirect,
    /// Plain relayed source, nothing deducted on arrival
    IndirectHubDirect,
    /// Incentivized-withdrawal source
    IncentivizedHubDirect,
}

impl RouteKind {
    /// Destination leg costs nothing
    pub fn is_fee_exempt(&self) -> bool {
        matches!(self, Self::DirectHubIndirect)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectHubDirect => "direct-hub-direct",
            Self::DirectHubIndirect => "direct-hub-indirect",
            Self::IndirectHubDirect => "indirect-hub-direct",
            Self::IncentivizedHubDirect => "incentivized-hub-direct",
        }
    }
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Path taken by a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", content = "kind", rename_all = "camelCase")]
pub enum RoutePath {
    /// Single hop out of the Hub
    FromHub,
    /// Single hop into the Hub
    ToHub,
    /// Two hops, forwarded by the Hub
    ViaHub(RouteKind),
}

/// A classified route between two chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub from: String,
    pub to: String,
    pub path: RoutePath,
}

impl Route {
    pub fn mode(&self) -> RouteMode {
        match self.path {
            RoutePath::FromHub | RoutePath::ToHub => RouteMode::Direct,
            RoutePath::ViaHub(_) => RouteMode::ViaHub,
        }
    }

    pub fn kind(&self) -> Option<RouteKind> {
        match self.path {
            RoutePath::ViaHub(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Classify the route from `from` to `to`
pub fn classify_route(from: &Chain, to: &Chain) -> Result<Route> {
    let unsupported = || BridgeError::UnsupportedRoute {
        from: from.name.clone(),
        to: to.name.clone(),
    };

    if from.name == to.name {
        return Err(unsupported());
    }

    use ChainDescriptor::{DirectChain, Hub, IndirectChain};
    let path = match (&from.descriptor, &to.descriptor) {
        (Hub { .. }, Hub { .. }) => return Err(unsupported()),
        (Hub { .. }, _) => RoutePath::FromHub,
        (_, Hub { .. }) => RoutePath::ToHub,
        (DirectChain { .. }, DirectChain { .. }) => RoutePath::ViaHub(RouteKind::DirectHubDirect),
        (DirectChain { .. }, IndirectChain { .. }) => {
            RoutePath::ViaHub(RouteKind::DirectHubIndirect)
        }
        (IndirectChain { settlement, .. }, DirectChain { .. }) => match settlement {
            Settlement::Relayed => RoutePath::ViaHub(RouteKind::IndirectHubDirect),
            Settlement::Incentivized => RoutePath::ViaHub(RouteKind::IncentivizedHubDirect),
        },
        (IndirectChain { .. }, IndirectChain { .. }) => return Err(unsupported()),
    };

    Ok(Route {
        from: from.name.clone(),
        to: to.name.clone(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::fallback_registry;

    fn route(from: &str, to: &str) -> Result<Route> {
        let registry = fallback_registry();
        classify_route(
            registry.chain(from).unwrap(),
            registry.chain(to).unwrap(),
        )
    }

    #[test]
    fn test_single_hop_routes() {
        let out = route("dymension", "base").unwrap();
        assert_eq!(out.path, RoutePath::FromHub);
        assert_eq!(out.mode(), RouteMode::Direct);
        assert_eq!(out.kind(), None);

        assert_eq!(route("kaspa", "dymension").unwrap().path, RoutePath::ToHub);
        assert_eq!(route("dymension", "osmosis").unwrap().path, RoutePath::FromHub);
        assert_eq!(route("osmosis", "dymension").unwrap().path, RoutePath::ToHub);
    }

    #[test]
    fn test_via_hub_kinds() {
        assert_eq!(
            route("ethereum", "solana").unwrap().kind(),
            Some(RouteKind::DirectHubDirect)
        );
        assert_eq!(
            route("kaspa", "osmosis").unwrap().kind(),
            Some(RouteKind::DirectHubIndirect)
        );
        assert_eq!(
            route("osmosis", "base").unwrap().kind(),
            Some(RouteKind::IndirectHubDirect)
        );
        assert_eq!(
            route("rollapp", "base").unwrap().kind(),
            Some(RouteKind::IncentivizedHubDirect)
        );
        assert_eq!(route("base", "ethereum").unwrap().mode(), RouteMode::ViaHub);
    }

    #[test]
    fn test_unsupported_routes() {
        assert!(matches!(
            route("osmosis", "rollapp"),
            Err(BridgeError::UnsupportedRoute { .. })
        ));
        assert!(matches!(
            route("base", "base"),
            Err(BridgeError::UnsupportedRoute { .. })
        ));
    }

    #[test]
    fn test_fee_exempt_only_for_indirect_destination() {
        assert!(RouteKind::DirectHubIndirect.is_fee_exempt());
        assert!(!RouteKind::DirectHubDirect.is_fee_exempt());
        assert!(!RouteKind::IncentivizedHubDirect.is_fee_exempt());
    }

    #[test]
    fn test_route_serde() {
        let json = serde_json::to_value(route("rollapp", "base").unwrap()).unwrap();
        assert_eq!(json["path"]["path"], "viaHub");
        assert_eq!(json["path"]["kind"], "incentivizedHubDirect");
    }
}
