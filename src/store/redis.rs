//! Redis Store Module
//!
//! Store capability over the `redis` crate against a set of replicated
//! nodes. Commands go to the node reporting the `master` role through a
//! small pool of multiplexed connections.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use redis::aio::MultiplexedConnection;
use redis::{Cmd, ConnectionAddr, ConnectionInfo, FromRedisValue, IntoConnectionInfo, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{KeyStream, KeyValueStore};
use crate::error::{CacheError, Result};

const SCHEMES: [&str; 2] = ["redis://", "rediss://"];

// == Value Codec ==
/// How values are laid out in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueCodec {
    /// JSON string literals, readable by JSON-codec clients sharing the store
    #[default]
    Json,
    /// Values stored byte for byte
    Raw,
}

impl ValueCodec {
    fn encode(self, value: &str) -> Result<String> {
        match self {
            ValueCodec::Json => Ok(serde_json::to_string(value)?),
            ValueCodec::Raw => Ok(value.to_string()),
        }
    }

    fn decode(self, stored: String) -> String {
        match self {
            // Values written by other clients may not be JSON; hand them back untouched
            ValueCodec::Json => serde_json::from_str::<String>(&stored).unwrap_or(stored),
            ValueCodec::Raw => stored,
        }
    }
}

impl FromStr for ValueCodec {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ValueCodec::Json),
            "raw" => Ok(ValueCodec::Raw),
            other => Err(CacheError::Config(format!("unknown value codec: {}", other))),
        }
    }
}

// == Options ==
/// Connection settings for [`RedisStore`].
#[derive(Debug, Clone)]
pub struct RedisOptions {
    /// Node addresses in the form `redis://host:port` or `rediss://host:port`
    pub nodes: Vec<String>,
    /// Logical database selected on every connection
    pub database: u32,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Number of pooled connections to the master
    pub pool_size: usize,
    /// Upper bound for one request/response exchange
    pub command_timeout: Duration,
    /// Value layout
    pub codec: ValueCodec,
    /// COUNT hint passed to SCAN
    pub scan_count: usize,
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self {
            nodes: vec!["redis://127.0.0.1:6379".to_string()],
            database: 0,
            username: None,
            password: None,
            pool_size: 4,
            command_timeout: Duration::from_secs(5),
            codec: ValueCodec::Json,
            scan_count: 100,
        }
    }
}

/// Parses a `redis://` or `rediss://` node address.
pub fn parse_node_address(node: &str) -> Result<ConnectionInfo> {
    if !SCHEMES.iter().any(|scheme| node.starts_with(scheme)) {
        return Err(CacheError::Config(format!(
            "node address '{}' must start with redis:// or rediss://",
            node
        )));
    }

    node.into_connection_info()
        .map_err(|err| CacheError::Config(format!("invalid node address '{}': {}", node, err)))
}

/// `host:port` of a parsed node, without credentials.
fn display_addr(info: &ConnectionInfo) -> String {
    match &info.addr {
        ConnectionAddr::Tcp(host, port) | ConnectionAddr::TcpTls { host, port, .. } => {
            format!("{}:{}", host, port)
        }
        other => format!("{:?}", other),
    }
}

// == Node ==
/// One resolved node: where to connect and with which credentials.
struct Node {
    addr: String,
    client: redis::Client,
}

impl Node {
    fn resolve(address: &str, options: &RedisOptions) -> Result<Self> {
        let mut info = parse_node_address(address)?;
        info.redis.db = i64::from(options.database);
        if options.username.is_some() {
            info.redis.username = options.username.clone();
        }
        if options.password.is_some() {
            info.redis.password = options.password.clone();
        }

        let addr = display_addr(&info);
        let client = redis::Client::open(info)
            .map_err(|err| CacheError::Config(format!("node {}: {}", addr, err)))?;
        Ok(Self { addr, client })
    }

    /// Opens a connection; AUTH and SELECT run as part of the handshake.
    async fn open(&self, timeout: Duration) -> Result<MultiplexedConnection> {
        let conn = tokio::time::timeout(timeout, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CacheError::Timeout(timeout))?
            .map_err(|err| match CacheError::from(err) {
                CacheError::StoreUnavailable(msg) => {
                    CacheError::StoreUnavailable(format!("{}: {}", self.addr, msg))
                }
                other => other,
            })?;
        debug!(addr = %self.addr, "Opened store connection");
        Ok(conn)
    }
}

/// Runs one command with a deadline.
///
/// Returns the reply and whether the connection can still be trusted.
async fn request<T: FromRedisValue + Send>(
    conn: &mut MultiplexedConnection,
    cmd: &Cmd,
    timeout: Duration,
) -> (Result<T>, bool) {
    let outcome: std::result::Result<redis::RedisResult<T>, _> =
        tokio::time::timeout(timeout, cmd.query_async(conn)).await;

    match outcome {
        Ok(Ok(reply)) => (Ok(reply), true),
        Ok(Err(err)) => {
            let err = CacheError::from(err);
            let healthy = !matches!(err, CacheError::StoreUnavailable(_));
            (Err(err), healthy)
        }
        Err(_) => (Err(CacheError::Timeout(timeout)), false),
    }
}

// == Redis Store ==
/// Store binding over the master of a replicated node set.
pub struct RedisStore {
    master: Node,
    options: RedisOptions,
    pool: Vec<Mutex<Option<MultiplexedConnection>>>,
    next: AtomicUsize,
    closed: AtomicBool,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("master", &self.master.addr)
            .field("database", &self.options.database)
            .field("pool_size", &self.pool.len())
            .finish()
    }
}

impl RedisStore {
    /// Locates the master node and opens the connection pool.
    pub async fn connect(options: RedisOptions) -> Result<Self> {
        if options.nodes.is_empty() {
            return Err(CacheError::Config("no store nodes configured".into()));
        }
        if options.pool_size == 0 {
            return Err(CacheError::Config("pool size must be at least 1".into()));
        }

        let master = Self::discover_master(&options).await?;

        let mut pool = Vec::with_capacity(options.pool_size);
        for _ in 0..options.pool_size {
            let conn = master.open(options.command_timeout).await?;
            pool.push(Mutex::new(Some(conn)));
        }

        info!(
            master = %master.addr,
            database = options.database,
            pool_size = options.pool_size,
            "Connected to store"
        );

        Ok(Self {
            master,
            options,
            pool,
            next: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Address (`host:port`) of the node receiving commands.
    pub fn master(&self) -> &str {
        &self.master.addr
    }

    async fn discover_master(options: &RedisOptions) -> Result<Node> {
        let mut nodes = options
            .nodes
            .iter()
            .map(|address| Node::resolve(address, options))
            .collect::<Result<Vec<_>>>()?;

        if nodes.len() == 1 {
            if let Some(only) = nodes.pop() {
                return Ok(only);
            }
        }

        let mut last_error = None;
        for node in nodes {
            let mut conn = match node.open(options.command_timeout).await {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(addr = %node.addr, error = %err, "Store node unreachable");
                    last_error = Some(err);
                    continue;
                }
            };

            let (reply, _) =
                request::<Vec<Value>>(&mut conn, &redis::cmd("ROLE"), options.command_timeout)
                    .await;
            match reply {
                Ok(role) if is_master_role(&role) => return Ok(node),
                Ok(_) => debug!(addr = %node.addr, "Store node is a replica"),
                Err(err) => {
                    warn!(addr = %node.addr, error = %err, "ROLE query failed");
                    last_error = Some(err);
                }
            }
        }

        Err(CacheError::StoreUnavailable(match last_error {
            Some(err) => format!("no master among configured nodes (last error: {})", err),
            None => "no master among configured nodes".to_string(),
        }))
    }

    /// Runs one command on the next pooled connection.
    ///
    /// A broken or timed-out connection is dropped and replaced on the
    /// following call; the failing command itself is not retried.
    async fn execute<T: FromRedisValue + Send>(&self, cmd: &Cmd) -> Result<T> {
        self.ensure_open()?;

        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        let mut guard = self.pool[slot].lock().await;
        // shutdown may have emptied the slot while we waited
        self.ensure_open()?;

        let mut conn = match guard.take() {
            Some(conn) => conn,
            None => {
                debug!(slot, "Reopening store connection");
                self.master.open(self.options.command_timeout).await?
            }
        };

        let (reply, healthy) = request(&mut conn, cmd, self.options.command_timeout).await;
        if healthy {
            *guard = Some(conn);
        }
        reply
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::StoreUnavailable("store binding is shut down".into()));
        }
        Ok(())
    }
}

fn is_master_role(reply: &[Value]) -> bool {
    reply
        .first()
        .and_then(|role| redis::from_redis_value::<String>(role).ok())
        .is_some_and(|role| role.eq_ignore_ascii_case("master"))
}

/// Strict UTF-8 decoding of a key or value read from the store.
fn decode_text(what: &str, raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|err| {
        CacheError::Protocol(format!(
            "{} is not valid UTF-8: {:?}",
            what,
            String::from_utf8_lossy(err.as_bytes())
        ))
    })
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let stored: Option<Vec<u8>> = self.execute(redis::cmd("GET").arg(key)).await?;
        match stored {
            Some(raw) => {
                let text = decode_text(&format!("value of '{}'", key), raw)?;
                Ok(Some(self.options.codec.decode(text)))
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let encoded = self.options.codec.encode(value)?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        self.execute::<()>(
            redis::cmd("SET")
                .arg(key)
                .arg(encoded)
                .arg("PX")
                .arg(ttl_ms),
        )
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed: i64 = self.execute(redis::cmd("DEL").arg(key)).await?;
        Ok(removed > 0)
    }

    fn scan_by_pattern(&self, pattern: &str) -> KeyStream<'_> {
        let pattern = pattern.to_string();
        let count = self.options.scan_count.max(1);

        // SCAN may return a key more than once; `seen` keeps each scan duplicate free
        stream::try_unfold((Some(0u64), HashSet::new()), move |(cursor, mut seen)| {
            let pattern = pattern.clone();
            async move {
                let Some(cursor) = cursor else {
                    return Ok(None);
                };
                let (next, raw_keys): (u64, Vec<Vec<u8>>) = self
                    .execute(
                        redis::cmd("SCAN")
                            .arg(cursor)
                            .arg("MATCH")
                            .arg(&pattern)
                            .arg("COUNT")
                            .arg(count),
                    )
                    .await?;

                let mut fresh = Vec::with_capacity(raw_keys.len());
                for raw in raw_keys {
                    let key = decode_text("scanned key", raw)?;
                    if seen.insert(key.clone()) {
                        fresh.push(key);
                    }
                }
                let next = (next != 0).then_some(next);
                Ok::<_, CacheError>(Some((fresh, (next, seen))))
            }
        })
        .map_ok(|keys| stream::iter(keys.into_iter().map(Ok::<String, CacheError>)))
        .try_flatten()
        .boxed()
    }

    async fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        for slot in &self.pool {
            if let Some(mut conn) = slot.lock().await.take() {
                let (reply, _) = request::<()>(
                    &mut conn,
                    &redis::cmd("QUIT"),
                    self.options.command_timeout,
                )
                .await;
                if let Err(err) = reply {
                    debug!(addr = %self.master.addr, error = %err, "QUIT failed; dropping connection");
                }
            }
        }

        info!(master = %self.master.addr, "Store connections released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_address() {
        let plain = parse_node_address("redis://localhost:6379").unwrap();
        assert_eq!(display_addr(&plain), "localhost:6379");

        let tls = parse_node_address("rediss://cache.internal:6380").unwrap();
        assert!(matches!(tls.addr, ConnectionAddr::TcpTls { .. }));
        assert_eq!(display_addr(&tls), "cache.internal:6380");

        let default_port = parse_node_address("redis://10.0.0.5").unwrap();
        assert_eq!(display_addr(&default_port), "10.0.0.5:6379");
    }

    #[test]
    fn test_parse_node_address_rejects_bad_forms() {
        for bad in [
            "localhost:6379",
            "http://host:6379",
            "redis+unix:///tmp/redis.sock",
            "redis://host:notaport",
            "redis://host:70000",
        ] {
            assert!(
                matches!(parse_node_address(bad), Err(CacheError::Config(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_resolve_applies_database_and_credentials() {
        let options = RedisOptions {
            database: 3,
            username: Some("cache".into()),
            password: Some("s3cret".into()),
            ..RedisOptions::default()
        };
        let node = Node::resolve("redis://:other@host:6379/1", &options).unwrap();
        let info = node.client.get_connection_info();

        assert_eq!(node.addr, "host:6379");
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.username.as_deref(), Some("cache"));
        assert_eq!(info.redis.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_json_codec() {
        let codec = ValueCodec::Json;
        assert_eq!(codec.encode("Demo Value").unwrap(), "\"Demo Value\"");
        assert_eq!(codec.decode("\"Demo Value\"".to_string()), "Demo Value");
        assert_eq!(codec.decode("not json".to_string()), "not json");
    }

    #[test]
    fn test_raw_codec() {
        let codec = ValueCodec::Raw;
        assert_eq!(codec.encode("\"q\"").unwrap(), "\"q\"");
        assert_eq!(codec.decode("\"q\"".to_string()), "\"q\"");
    }

    #[test]
    fn test_codec_from_str() {
        assert_eq!("JSON".parse::<ValueCodec>().unwrap(), ValueCodec::Json);
        assert_eq!("raw".parse::<ValueCodec>().unwrap(), ValueCodec::Raw);
        assert!("yaml".parse::<ValueCodec>().is_err());
    }

    #[test]
    fn test_is_master_role() {
        let master = vec![
            Value::BulkString(b"master".to_vec()),
            Value::Int(0),
            Value::Array(vec![]),
        ];
        let replica = vec![Value::BulkString(b"slave".to_vec())];

        assert!(is_master_role(&master));
        assert!(!is_master_role(&replica));
        assert!(!is_master_role(&[]));
    }

    #[test]
    fn test_decode_text_is_strict() {
        assert_eq!(decode_text("key", b"T_a".to_vec()).unwrap(), "T_a");
        assert!(matches!(
            decode_text("key", b"T_\xff".to_vec()),
            Err(CacheError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_requires_nodes() {
        let options = RedisOptions {
            nodes: vec![],
            ..RedisOptions::default()
        };
        assert!(matches!(
            RedisStore::connect(options).await,
            Err(CacheError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_is_unavailable() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let options = RedisOptions {
            nodes: vec![format!("redis://127.0.0.1:{}", port)],
            command_timeout: Duration::from_millis(500),
            ..RedisOptions::default()
        };
        let result = RedisStore::connect(options).await;
        assert!(matches!(
            result,
            Err(CacheError::StoreUnavailable(_)) | Err(CacheError::Timeout(_))
        ));
    }
}
