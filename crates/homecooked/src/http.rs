//! HTTP plumbing shared by the API-backed tools

use crate::prelude::*;
use homecooked_core::graphql::{GraphQlRequest, GraphQlResponse};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;

const DEFAULT_USER_AGENT: &str = concat!("homecooked/", env!("CARGO_PKG_VERSION"));

/// How a client authenticates against a service.
#[derive(Debug, Clone)]
pub enum Auth {
    None,
    /// `Authorization: <token>`, as Linear expects personal API keys.
    Raw(String),
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: <scheme> <token>`, e.g. Readwise's `Token` scheme.
    Scheme { scheme: String, token: String },
    /// `Authorization: Basic base64(user:password)`
    Basic { user: String, password: String },
}

fn authorization_value(auth: &Auth) -> Option<String> {
    use base64::Engine;

    match auth {
        Auth::None => None,
        Auth::Raw(token) => Some(token.clone()),
        Auth::Bearer(token) => Some(format!("Bearer {token}")),
        Auth::Scheme { scheme, token } => Some(format!("{scheme} {token}")),
        Auth::Basic { user, password } => {
            let encoded =
                base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
            Some(format!("Basic {encoded}"))
        }
    }
}

/// Build a client with the auth and JSON headers every request needs.
pub fn create_client(auth: &Auth) -> Result<reqwest::Client> {
    build_client(auth, "application/json")
}

/// Build an unauthenticated client for scraping HTML pages.
pub fn create_html_client() -> Result<reqwest::Client> {
    build_client(&Auth::None, "text/html,application/xhtml+xml")
}

fn build_client(auth: &Auth, accept: &'static str) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();

    if let Some(value) = authorization_value(auth) {
        let mut value =
            HeaderValue::from_str(&value).map_err(|e| eyre!("Invalid header value: {}", e))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// Turn a non-2xx response into [`Error::Http`] so the retry guard can classify it.
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Http {
        status: status.as_u16(),
        body,
    }
    .into())
}

/// GET `url` and decode the JSON body.
pub async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    send_json(client.get(url)).await
}

/// Send a prepared request and decode the JSON body.
pub async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| eyre!("Failed to send request: {}", e))?;
    let url = response.url().to_string();

    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse response from {}: {}", url, e))
}

/// POST a GraphQL query and return its `data`, mapping `errors` to [`Error::GraphQl`].
pub async fn post_graphql<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &str,
    variables: serde_json::Value,
) -> Result<T> {
    let request = GraphQlRequest { query, variables };

    let response = client
        .post(url)
        .json(&request)
        .send()
        .await
        .map_err(|e| eyre!("Failed to send GraphQL request to {}: {}", url, e))?;

    let body: GraphQlResponse<T> = check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse GraphQL response: {}", e))?;

    body.into_result().map_err(|message| Error::GraphQl(message).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_values() {
        assert_eq!(authorization_value(&Auth::None), None);
        assert_eq!(
            authorization_value(&Auth::Raw("lin_api_1".to_string())).as_deref(),
            Some("lin_api_1")
        );
        assert_eq!(
            authorization_value(&Auth::Bearer("abc".to_string())).as_deref(),
            Some("Bearer abc")
        );
        assert_eq!(
            authorization_value(&Auth::Scheme {
                scheme: "Token".to_string(),
                token: "abc".to_string()
            })
            .as_deref(),
            Some("Token abc")
        );
        // base64("agent@example.com/token:secret")
        assert_eq!(
            authorization_value(&Auth::Basic {
                user: "agent@example.com/token".to_string(),
                password: "secret".to_string()
            })
            .as_deref(),
            Some("Basic YWdlbnRAZXhhbXBsZS5jb20vdG9rZW46c2VjcmV0")
        );
    }

    #[test]
    fn test_create_client() {
        assert!(create_client(&Auth::Bearer("abc".to_string())).is_ok());
        assert!(create_html_client().is_ok());
    }
}
