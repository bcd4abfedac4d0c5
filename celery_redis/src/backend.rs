use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use celery_core::{CeleryError, DisconnectedError, UnimplementedError};
use celery_message::{PackError, ResultEnvelope};
use celery_uri::Uri;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::sentinel::SentinelClient;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;
use uuid::Uuid;

use crate::options::RedisOptions;
use crate::Handle;

/// Composes the Redis key a result is stored/published/consulted under.
fn result_key(key_prefix: &str, task_id: Uuid) -> String {
    format!("{key_prefix}{task_id}")
}

/// How this backend reaches its Redis topology: a connection-pooled
/// "command" path for `GET`/`SET`/`DEL`, and a dedicated client used to
/// open one exclusive subscriber connection per [`RedisBackend::get`] call.
enum Connections {
    Standalone {
        pool: bb8::Pool<RedisConnectionManager>,
        pubsub_client: Client,
    },
    Sentinel {
        client: AsyncMutex<SentinelClient>,
        pubsub_client: Client,
    },
    Cluster {
        connection: ClusterConnection,
        // Redis Cluster's PUBLISH is a cluster-wide broadcast regardless of
        // slot, so subscribing against any single seed node observes every
        // publish; see DESIGN.md.
        pubsub_client: Client,
    },
}

/// Stores and notifies task results over Redis: `SET ... EX` plus `PUBLISH`
/// on [`put`](Self::put), a subscribe-before-get race on [`get`](Self::get).
pub struct RedisBackend {
    identifier: String,
    key_prefix: String,
    result_expires_secs: u64,
    connections: Connections,
}

impl RedisBackend {
    /// Opens a connection (or connection pool) to `handle`'s topology.
    pub async fn new(handle: impl AsRef<Handle>) -> Result<Self, CeleryError> {
        let handle = handle.as_ref();
        let base = handle.options().base();

        let connections = match handle.options() {
            RedisOptions::Tcp { secure, host, port, base } => {
                let info = Self::tcp_connection_info(*secure, host, *port, base.password.clone(), base.db);
                Self::connect_standalone(info).await?
            }
            RedisOptions::Socket { secure, path, base } => {
                let info = Self::socket_connection_info(*secure, path, base.password.clone(), base.db);
                Self::connect_standalone(info).await?
            }
            RedisOptions::Sentinel { secure, nodes, service_name, base } => {
                Self::connect_sentinel(*secure, nodes, service_name, base.password.clone(), base.db).await?
            }
            RedisOptions::Cluster { nodes, .. } => Self::connect_cluster(nodes).await?,
        };

        Ok(Self {
            identifier: handle.identifier().to_string(),
            key_prefix: base.key_prefix.clone(),
            result_expires_secs: base.result_expires_secs,
            connections,
        })
    }

    fn tcp_connection_info(secure: bool, host: &str, port: u16, password: Option<String>, db: Option<u64>) -> ConnectionInfo {
        ConnectionInfo {
            addr: if secure {
                ConnectionAddr::TcpTls { host: host.to_string(), port, insecure: false, tls_params: None }
            } else {
                ConnectionAddr::Tcp(host.to_string(), port)
            },
            redis: RedisConnectionInfo {
                db: db.unwrap_or(0) as i64,
                username: None,
                password,
                protocol: Default::default(),
            },
        }
    }

    fn socket_connection_info(_secure: bool, path: &str, password: Option<String>, db: Option<u64>) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Unix(path.into()),
            redis: RedisConnectionInfo {
                db: db.unwrap_or(0) as i64,
                username: None,
                password,
                protocol: Default::default(),
            },
        }
    }

    async fn connect_standalone(info: ConnectionInfo) -> Result<Connections, CeleryError> {
        let pubsub_client = Client::open(info.clone()).map_err(Self::driver_error)?;
        let manager = RedisConnectionManager::new(info).map_err(Self::driver_error)?;
        let pool = bb8::Pool::builder().build(manager).await.map_err(Self::driver_error)?;

        Ok(Connections::Standalone { pool, pubsub_client })
    }

    async fn connect_sentinel(
        secure: bool,
        nodes: &[(String, u16)],
        service_name: &str,
        password: Option<String>,
        db: Option<u64>,
    ) -> Result<Connections, CeleryError> {
        let node_infos: Vec<ConnectionInfo> = nodes
            .iter()
            .map(|(host, port)| Self::tcp_connection_info(secure, host, *port, password.clone(), None))
            .collect();

        let client = SentinelClient::build(
            node_infos,
            service_name.to_string(),
            Some(redis::sentinel::SentinelNodeConnectionInfo {
                tls_mode: None,
                redis_connection_info: Some(RedisConnectionInfo {
                    db: db.unwrap_or(0) as i64,
                    username: None,
                    password: password.clone(),
                    protocol: Default::default(),
                }),
            }),
            redis::sentinel::SentinelServerType::Master,
        )
        .map_err(Self::driver_error)?;

        let (seed_host, seed_port) = nodes.first().cloned().unwrap_or_else(|| ("localhost".to_string(), 26379));
        let pubsub_client = Client::open(Self::tcp_connection_info(secure, &seed_host, seed_port, password, db))
            .map_err(Self::driver_error)?;

        Ok(Connections::Sentinel { client: AsyncMutex::new(client), pubsub_client })
    }

    async fn connect_cluster(nodes: &[String]) -> Result<Connections, CeleryError> {
        let client = ClusterClient::new(nodes.to_vec()).map_err(Self::driver_error)?;
        let connection = client.get_async_connection().await.map_err(Self::driver_error)?;

        let seed = nodes.first().cloned().unwrap_or_else(|| "redis://localhost:6379".to_string());
        let pubsub_client = Client::open(seed).map_err(Self::driver_error)?;

        Ok(Connections::Cluster { connection, pubsub_client })
    }

    fn key_for(&self, task_id: Uuid) -> String {
        result_key(&self.key_prefix, task_id)
    }

    fn driver_error(error: redis::RedisError) -> CeleryError {
        CeleryError::Disconnected(DisconnectedError(error.to_string()))
    }

    async fn command_get(&self, key: &str) -> Result<Option<Vec<u8>>, CeleryError> {
        match &self.connections {
            Connections::Standalone { pool, .. } => {
                let mut connection = pool.get().await.map_err(Self::driver_error)?;
                connection.get(key).await.map_err(Self::driver_error)
            }
            Connections::Sentinel { client, .. } => {
                let mut client = client.lock().await;
                let mut connection: MultiplexedConnection = client.get_async_connection().await.map_err(Self::driver_error)?;
                connection.get(key).await.map_err(Self::driver_error)
            }
            Connections::Cluster { connection, .. } => {
                let mut connection = connection.clone();
                connection.get(key).await.map_err(Self::driver_error)
            }
        }
    }

    async fn command_set(&self, key: &str, payload: &[u8]) -> Result<(), CeleryError> {
        match &self.connections {
            Connections::Standalone { pool, .. } => {
                let mut connection = pool.get().await.map_err(Self::driver_error)?;
                connection
                    .set_ex::<_, _, ()>(key, payload, self.result_expires_secs)
                    .await
                    .map_err(Self::driver_error)
            }
            Connections::Sentinel { client, .. } => {
                let mut client = client.lock().await;
                let mut connection: MultiplexedConnection = client.get_async_connection().await.map_err(Self::driver_error)?;
                connection
                    .set_ex::<_, _, ()>(key, payload, self.result_expires_secs)
                    .await
                    .map_err(Self::driver_error)
            }
            Connections::Cluster { connection, .. } => {
                let mut connection = connection.clone();
                connection
                    .set_ex::<_, _, ()>(key, payload, self.result_expires_secs)
                    .await
                    .map_err(Self::driver_error)
            }
        }
    }

    async fn command_publish(&self, key: &str, payload: &[u8]) -> Result<(), CeleryError> {
        match &self.connections {
            Connections::Standalone { pool, .. } => {
                let mut connection = pool.get().await.map_err(Self::driver_error)?;
                connection.publish::<_, _, ()>(key, payload).await.map_err(Self::driver_error)
            }
            Connections::Sentinel { client, .. } => {
                let mut client = client.lock().await;
                let mut connection: MultiplexedConnection = client.get_async_connection().await.map_err(Self::driver_error)?;
                connection.publish::<_, _, ()>(key, payload).await.map_err(Self::driver_error)
            }
            Connections::Cluster { connection, .. } => {
                let mut connection = connection.clone();
                connection.publish::<_, _, ()>(key, payload).await.map_err(Self::driver_error)
            }
        }
    }

    async fn command_del(&self, key: &str) -> Result<i64, CeleryError> {
        match &self.connections {
            Connections::Standalone { pool, .. } => {
                let mut connection = pool.get().await.map_err(Self::driver_error)?;
                connection.del(key).await.map_err(Self::driver_error)
            }
            Connections::Sentinel { client, .. } => {
                let mut client = client.lock().await;
                let mut connection: MultiplexedConnection = client.get_async_connection().await.map_err(Self::driver_error)?;
                connection.del(key).await.map_err(Self::driver_error)
            }
            Connections::Cluster { connection, .. } => {
                let mut connection = connection.clone();
                connection.del(key).await.map_err(Self::driver_error)
            }
        }
    }

    fn pubsub_client(&self) -> &Client {
        match &self.connections {
            Connections::Standalone { pubsub_client, .. } => pubsub_client,
            Connections::Sentinel { pubsub_client, .. } => pubsub_client,
            Connections::Cluster { pubsub_client, .. } => pubsub_client,
        }
    }

    /// Subscribes to `key` first, then `GET`s it, resolving the race the
    /// spec requires against a concurrent `SET`-then-`PUBLISH`: whichever of
    /// our own `GET` or the subscription's first message observes the
    /// result wins.
    async fn await_result(&self, key: &str) -> Result<ResultEnvelope, CeleryError> {
        let mut pubsub = self.pubsub_client().get_async_pubsub().await.map_err(Self::driver_error)?;
        pubsub.subscribe(key).await.map_err(Self::driver_error)?;

        if let Some(raw) = self.command_get(key).await? {
            let _ = pubsub.unsubscribe(key).await;
            return Self::decode(&raw);
        }

        let raw = {
            let mut messages = pubsub.on_message();
            let message = messages.next().await.ok_or_else(|| {
                CeleryError::Disconnected(DisconnectedError("the Redis pubsub connection was closed".to_string()))
            })?;
            message.get_payload_bytes().to_vec()
        };

        let _ = pubsub.unsubscribe(key).await;
        Self::decode(&raw)
    }

    fn decode(raw: &[u8]) -> Result<ResultEnvelope, CeleryError> {
        serde_json::from_slice(raw).map_err(|error| CeleryError::Pack(PackError::Deserialize(error.to_string())))
    }
}

#[async_trait]
impl celery_core::ResultBackend for RedisBackend {
    async fn put(&self, result_message: &ResultEnvelope) {
        let key = self.key_for(result_message.task_id);

        let payload = match serde_json::to_vec(result_message) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(?error, error_message = %error, "Failed to serialize a result for the Redis backend");
                return;
            }
        };

        if let Err(error) = self.command_set(&key, &payload).await {
            warn!(identifier = self.identifier.as_str(), ?error, "Failed to SET a result in Redis");
            return;
        }

        if let Err(error) = self.command_publish(&key, &payload).await {
            warn!(identifier = self.identifier.as_str(), ?error, "Failed to PUBLISH a result to Redis");
        }
    }

    async fn get(&self, task_id: Uuid, timeout: Option<Duration>) -> Result<ResultEnvelope, CeleryError> {
        let key = self.key_for(task_id);
        let outcome = celery_util::with_timeout(self.await_result(&key), timeout).await;

        match outcome {
            Err(_) => Err(celery_util::TimeoutError.into()),
            Ok(result) => result,
        }
    }

    async fn delete(&self, task_id: Uuid) -> String {
        let key = self.key_for(task_id);

        match self.command_del(&key).await {
            Ok(removed) if removed > 0 => "1".to_string(),
            Ok(_) => "0".to_string(),
            Err(error) => {
                warn!(identifier = self.identifier.as_str(), ?error, "Failed to DEL a result in Redis");
                "0".to_string()
            }
        }
    }

    async fn end(&self) {}

    fn uri(&self) -> Result<Uri, UnimplementedError> {
        Err(UnimplementedError("RedisBackend::uri".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn result_key_applies_the_configured_prefix() {
        // Given
        let task_id = Uuid::nil();

        // Then
        assert_eq!(result_key("celery-task-meta-", task_id), format!("celery-task-meta-{task_id}"));
    }

    #[test]
    fn decode_parses_a_result_envelope() {
        // Given
        let json = format!(
            r#"{{"task_id":"{}","status":"SUCCESS","result":25,"children":[]}}"#,
            Uuid::nil()
        );

        // When
        let envelope = RedisBackend::decode(json.as_bytes()).unwrap();

        // Then
        assert_eq!(envelope.task_id, Uuid::nil());
        assert_eq!(envelope.result, serde_json::json!(25));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(RedisBackend::decode(b"not json").is_err());
    }
}
