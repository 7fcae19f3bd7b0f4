//! Request metadata extractors.

use crate::errors::ApiError;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;
use store::types::Id;
use surveys::input::ClientInfo;

/// Set by the upstream authenticator.
pub const USER_HEADER: &str = "x-user-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The authenticated author a request acts for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActingUser(pub Id);

impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<Id>().ok())
            .filter(|id| *id > 0)
            .map(ActingUser)
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Respondent address and user agent. The first `x-forwarded-for` hop wins
/// over the peer address.
pub struct Client(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for Client {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|hop| hop.trim().to_string())
            .filter(|hop| !hop.is_empty());

        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_default();

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(Client(ClientInfo { ip, user_agent }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_acting_user() {
        let mut ok = parts(&[(USER_HEADER, " 42 ")]);
        assert_eq!(
            ActingUser::from_request_parts(&mut ok, &()).await.unwrap(),
            ActingUser(42)
        );

        for headers in [vec![], vec![(USER_HEADER, "abc")], vec![(USER_HEADER, "0")]] {
            let mut bad = parts(&headers);
            assert!(matches!(
                ActingUser::from_request_parts(&mut bad, &()).await,
                Err(ApiError::Unauthenticated)
            ));
        }
    }

    #[tokio::test]
    async fn test_client_info() {
        let mut forwarded = parts(&[
            (FORWARDED_FOR_HEADER, "203.0.113.7, 10.0.0.1"),
            ("user-agent", "curl/8.0"),
        ]);
        let Client(info) = Client::from_request_parts(&mut forwarded, &())
            .await
            .unwrap();
        assert_eq!(info.ip, "203.0.113.7");
        assert_eq!(info.user_agent, "curl/8.0");

        let mut peer = parts(&[]);
        peer.extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 5000))));
        let Client(info) = Client::from_request_parts(&mut peer, &()).await.unwrap();
        assert_eq!(info.ip, "192.0.2.9");
        assert_eq!(info.user_agent, "");
    }
}
