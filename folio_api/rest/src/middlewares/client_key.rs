//! Derive the identity the contact rate limit is keyed by

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::{from_fn, Next},
    Router,
};

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router.layer(from_fn(|mut request: Request, next: Next| {
        let client_key = ClientKey::from_request(&request);
        request.extensions_mut().insert(client_key);
        next.run(request)
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(pub String);

impl ClientKey {
    /// Used when neither a forwarded address nor the peer address is known.
    pub const UNKNOWN: &'static str = "unknown";

    fn from_request(request: &Request) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Self::derive(request.headers(), peer)
    }

    /// The first hop of `X-Forwarded-For`, falling back to the peer address.
    ///
    /// The header is trusted as is, a client talking to the server directly
    /// can choose its own key.
    fn derive(headers: &HeaderMap, peer: Option<String>) -> Self {
        let forwarded = headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        Self(
            forwarded
                .or(peer)
                .unwrap_or_else(|| Self::UNKNOWN.to_owned()),
        )
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
