use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::prelude::*;

/// Best guess at the client address: proxy headers first, then the socket peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ClientIp(pub(crate) String);

impl ClientIp {
    fn from_parts(parts: &Parts) -> Self {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };

        if let Some(forwarded) = header_value("x-forwarded-for")
            && let Some(first) = forwarded.split(',').map(str::trim).find(|hop| !hop.is_empty())
        {
            return Self(first.to_string());
        }
        if let Some(real_ip) = header_value("x-real-ip") {
            let real_ip = real_ip.trim();
            if !real_ip.is_empty() {
                return Self(real_ip.to_string());
            }
        }
        match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => Self(addr.ip().to_string()),
            None => Self("unknown".to_string()),
        }
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// A `Json<T>` wrapper whose rejections use the regular failure body.
pub(crate) struct RosterJson<T>(pub(crate) T);

impl<S, T> FromRequest<S> for RosterJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RosterError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| RosterError::BadRequest(err.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).expect("request").into_parts().0
    }

    #[test]
    fn forwarded_for_wins() {
        let parts = parts(
            HttpRequest::builder()
                .header("x-forwarded-for", " 198.51.100.4 , 10.0.0.1")
                .header("x-real-ip", "10.0.0.2"),
        );
        assert_eq!(ClientIp::from_parts(&parts).0, "198.51.100.4");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let mut with_peer = parts(HttpRequest::builder());
        with_peer
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(ClientIp::from_parts(&with_peer).0, "192.0.2.1");

        let bare = parts(HttpRequest::builder());
        assert_eq!(ClientIp::from_parts(&bare).0, "unknown");

        let real = parts(HttpRequest::builder().header("x-real-ip", "203.0.113.9"));
        assert_eq!(ClientIp::from_parts(&real).0, "203.0.113.9");
    }
}
