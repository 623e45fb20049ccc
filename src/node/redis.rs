use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Value};
use tokio::sync::OnceCell;

use super::cache::{CacheBatch, CacheClient, CacheCommand, CacheReply};

/// Redis-backed [`CacheClient`]
///
/// A batch runs as one `MULTI`/`EXEC` pipeline over a shared multiplexed
/// connection that is opened on first use.
pub struct RedisCache {
    client: Client,
    conn: OnceCell<MultiplexedConnection>,
}

impl RedisCache {
    pub fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| self.client.get_multiplexed_tokio_connection())
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl CacheClient for RedisCache {
    async fn exec(&self, batch: CacheBatch) -> anyhow::Result<Vec<CacheReply>> {
        let commands = batch.into_commands();
        let mut pipe = redis::pipe();
        pipe.atomic();
        let mut sent = 0;
        for command in &commands {
            match command {
                // MGET without keys is a protocol error
                CacheCommand::MGet(keys) if keys.is_empty() => {}
                CacheCommand::MGet(keys) => {
                    pipe.cmd("MGET").arg(keys);
                    sent += 1;
                }
                CacheCommand::LLen(key) => {
                    pipe.cmd("LLEN").arg(key);
                    sent += 1;
                }
            }
        }

        let values: Vec<Value> = if sent == 0 {
            Vec::new()
        } else {
            let mut conn = self.connection().await?;
            pipe.query_async(&mut conn).await?
        };
        splice_replies(&commands, values)
    }
}

/// Pair transaction replies with the commands of a batch
///
/// Empty `MGET`s were never sent; they get an empty reply in their slot.
fn splice_replies(
    commands: &[CacheCommand],
    values: Vec<Value>,
) -> anyhow::Result<Vec<CacheReply>> {
    let sent = commands
        .iter()
        .filter(|command| !matches!(command, CacheCommand::MGet(keys) if keys.is_empty()))
        .count();
    if values.len() != sent {
        anyhow::bail!("transaction returned {} replies for {} commands", values.len(), sent);
    }

    let mut values = values.into_iter();
    commands
        .iter()
        .map(|command| match command {
            CacheCommand::MGet(keys) if keys.is_empty() => Ok(CacheReply::Values(Vec::new())),
            _ => match values.next() {
                Some(value) => convert_reply(value),
                None => anyhow::bail!("missing transaction reply"),
            },
        })
        .collect()
}

fn convert_reply(value: Value) -> anyhow::Result<CacheReply> {
    Ok(match value {
        Value::Int(n) => CacheReply::Integer(n),
        Value::Nil => CacheReply::Bulk(None),
        Value::Data(bytes) => CacheReply::Bulk(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Value::Status(status) => CacheReply::Bulk(Some(status)),
        Value::Bulk(items) => CacheReply::Values(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Data(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Value::Int(n) => Some(n.to_string()),
                    Value::Status(status) => Some(status),
                    _ => None,
                })
                .collect(),
        ),
        Value::Okay => anyhow::bail!("unexpected OK reply"),
    })
}
