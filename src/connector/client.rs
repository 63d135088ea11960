use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{Connector, ConnectorError, ConnectorStatus, UpstreamBatch};
use crate::sync::normalize::UpstreamRecord;

const USER_AGENT: &str = concat!("biotrack/", env!("CARGO_PKG_VERSION"));

const STATUS_ENDPOINT: &str = "status";
const USERS_ENDPOINT: &str = "sync/users";
const LOGS_ENDPOINT: &str = "sync/logs";

#[derive(Debug, Default, Deserialize)]
struct StatusPayload {
    connected: Option<bool>,
    online: Option<bool>,
    ok: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct UsersPayload {
    #[serde(default)]
    users: Vec<Value>,
    count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LogsPayload {
    #[serde(default)]
    logs: Vec<Value>,
    count: Option<usize>,
}

fn into_batch(items: Vec<Value>, count: Option<usize>) -> UpstreamBatch {
    let records: Vec<UpstreamRecord> = items.into_iter().map(UpstreamRecord::from_value).collect();
    UpstreamBatch {
        count: count.unwrap_or(records.len()),
        records,
    }
}

/// HTTP client for the connector's `/status` and `/sync/*` endpoints.
///
/// Every call checks the base URL first, so an unconfigured client fails
/// without touching the network.
pub struct ConnectorClient {
    http_client: reqwest::Client,
    base_url: Option<String>,
}

impl ConnectorClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url: base_url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<String, ConnectorError> {
        let base = self.base_url.as_deref().ok_or(ConnectorError::NotConfigured)?;
        Ok(format!("{base}/{endpoint}"))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        endpoint: &'static str,
    ) -> Result<reqwest::Response, ConnectorError> {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!(%url, %method, "Calling connector");

        let response = self
            .http_client
            .request(method, &url)
            .send()
            .await
            .map_err(|source| ConnectorError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = status.as_u16(), "Connector returned an error status");
            return Err(ConnectorError::Http {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn call<T>(&self, method: reqwest::Method, endpoint: &'static str) -> Result<T, ConnectorError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.send(method, endpoint)
            .await?
            .json::<T>()
            .await
            .map_err(|source| ConnectorError::Decode { endpoint, source })
    }
}

#[async_trait]
impl Connector for ConnectorClient {
    async fn status(&self) -> Result<ConnectorStatus, ConnectorError> {
        let body = self
            .send(reqwest::Method::GET, STATUS_ENDPOINT)
            .await?
            .bytes()
            .await
            .map_err(|source| ConnectorError::Transport {
                endpoint: STATUS_ENDPOINT,
                source,
            })?;
        // Any 2xx counts as reachable unless the body explicitly says otherwise.
        let payload: StatusPayload = serde_json::from_slice(&body).unwrap_or_default();
        let connected = payload
            .connected
            .or(payload.online)
            .or(payload.ok)
            .unwrap_or(true);
        Ok(ConnectorStatus { connected })
    }

    async fn sync_users(&self) -> Result<UpstreamBatch, ConnectorError> {
        let payload: UsersPayload = self.call(reqwest::Method::POST, USERS_ENDPOINT).await?;
        let batch = into_batch(payload.users, payload.count);
        tracing::info!(count = batch.count, received = batch.records.len(), "Connector user export received");
        Ok(batch)
    }

    async fn sync_logs(&self) -> Result<UpstreamBatch, ConnectorError> {
        let payload: LogsPayload = self.call(reqwest::Method::POST, LOGS_ENDPOINT).await?;
        let batch = into_batch(payload.logs, payload.count);
        tracing::info!(count = batch.count, received = batch.records.len(), "Connector log export received");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, HttpServer, web};
    use serde_json::json;

    /// Starts a throwaway connector on an ephemeral port and returns its base URL.
    fn spawn_connector(status_code: u16) -> String {
        let server = HttpServer::new(move || {
            App::new()
                .route(
                    "/status",
                    web::get().to(move || async move {
                        if status_code == 200 {
                            HttpResponse::Ok().json(json!({"ok": true, "connected": true}))
                        } else if status_code == 202 {
                            HttpResponse::Accepted().body("OK")
                        } else {
                            HttpResponse::InternalServerError().body("device bridge down")
                        }
                    }),
                )
                .route(
                    "/sync/users",
                    web::post().to(|| async {
                        HttpResponse::Ok().json(json!({
                            "ok": true,
                            "users": [{"userid": 1, "name": "Ali"}, {"uid": "2"}, 5]
                        }))
                    }),
                )
                .route(
                    "/sync/logs",
                    web::post().to(|| async {
                        HttpResponse::Ok().json(json!({"ok": true, "count": 40, "logs": []}))
                    }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}/")
    }

    #[actix_web::test]
    async fn unconfigured_client_fails_before_network() {
        let client = ConnectorClient::new(Some("   ".into()), None).unwrap();
        assert!(matches!(client.status().await, Err(ConnectorError::NotConfigured)));
        assert!(matches!(client.sync_users().await, Err(ConnectorError::NotConfigured)));

        let client = ConnectorClient::new(None, None).unwrap();
        assert!(matches!(client.sync_logs().await, Err(ConnectorError::NotConfigured)));
    }

    #[test]
    fn endpoint_url_strips_trailing_slash() {
        let client = ConnectorClient::new(Some("http://bridge:8090/".into()), None).unwrap();
        assert_eq!(client.endpoint_url("sync/logs").unwrap(), "http://bridge:8090/sync/logs");
    }

    #[actix_web::test]
    async fn reads_status_and_exports() {
        let base = spawn_connector(200);
        let client = ConnectorClient::new(Some(base), Some(Duration::from_secs(5))).unwrap();

        assert!(client.status().await.unwrap().connected);

        let users = client.sync_users().await.unwrap();
        assert_eq!(users.count, 3);
        assert_eq!(users.records[0].identifier(), "1");
        assert_eq!(users.records[1].identifier(), "2");
        assert_eq!(users.records[2].identifier(), "");

        let logs = client.sync_logs().await.unwrap();
        assert_eq!(logs.count, 40);
        assert!(logs.records.is_empty());
    }

    #[actix_web::test]
    async fn plain_text_status_counts_as_connected() {
        let base = spawn_connector(202);
        let client = ConnectorClient::new(Some(base), Some(Duration::from_secs(5))).unwrap();
        assert!(client.status().await.unwrap().connected);
    }

    #[actix_web::test]
    async fn non_success_status_is_an_http_error() {
        let base = spawn_connector(500);
        let client = ConnectorClient::new(Some(base), Some(Duration::from_secs(5))).unwrap();

        match client.status().await {
            Err(ConnectorError::Http { status, body, endpoint }) => {
                assert_eq!(status, 500);
                assert_eq!(endpoint, "status");
                assert_eq!(body, "device bridge down");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }
}
