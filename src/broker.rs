use std::collections::HashMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, TellerError};
use crate::settings::{BrokerSettings, OffsetReset};

const WATCH_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct LogMessage {
    pub offset: u64,
    pub payload: String,
}

/// Consumer-side seam to the event log. `poll` blocks up to `timeout` and
/// returns the next message past the last committed offset; `commit`
/// acknowledges progress past a message. Redelivery of anything not
/// committed is expected (at-least-once).
#[async_trait]
pub trait EventLog {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<LogMessage>>;
    async fn commit(&mut self, msg: &LogMessage) -> Result<()>;
}

/// Durable single-partition log: one JSONL file per topic, offset = line
/// index, committed offsets per group id in a JSON sidecar. A local
/// stand-in for a real broker; partition assignment and rebalancing stay
/// the broker's job.
pub struct FileLog {
    log_path: PathBuf,
    offsets_path: PathBuf,
    topic: String,
    position: u64,
}

impl FileLog {
    pub fn open(settings: &BrokerSettings) -> Result<Self> {
        let log_dir = PathBuf::from(&settings.log_dir);
        std::fs::create_dir_all(log_dir.join("offsets"))?;
        let log_path = log_dir.join(format!("{}.log", settings.topic));
        let offsets_path = log_dir.join("offsets").join(format!("{}.json", settings.group_id));

        let offsets = load_offsets(&offsets_path)?;
        let position = match offsets.get(&settings.topic) {
            Some(committed) => *committed,
            None => match settings.offset_reset {
                OffsetReset::Earliest => 0,
                OffsetReset::Latest => line_count(&log_path)?,
            },
        };

        Ok(Self {
            log_path,
            offsets_path,
            topic: settings.topic.clone(),
            position,
        })
    }

    /// Producer-side append. Payloads are opaque to the log; one per line.
    pub fn publish(&self, payload: &str) -> Result<u64> {
        if payload.contains('\n') {
            return Err(TellerError::Log("payload must not contain newlines".into()));
        }
        let offset = line_count(&self.log_path)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{payload}")?;
        Ok(offset)
    }

    fn read_at(&self, offset: u64) -> Result<Option<LogMessage>> {
        if !self.log_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.log_path)?;
        Ok(content
            .lines()
            .nth(offset as usize)
            .map(|line| LogMessage { offset, payload: line.to_string() }))
    }
}

#[async_trait]
impl EventLog for FileLog {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<LogMessage>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(msg) = self.read_at(self.position)? {
                return Ok(Some(msg));
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep_until(deadline.min(now + WATCH_INTERVAL)).await;
        }
    }

    async fn commit(&mut self, msg: &LogMessage) -> Result<()> {
        self.position = msg.offset + 1;
        let mut offsets = load_offsets(&self.offsets_path)?;
        offsets.insert(self.topic.clone(), self.position);
        let json = serde_json::to_string_pretty(&offsets)?;
        std::fs::write(&self.offsets_path, format!("{json}\n"))?;
        Ok(())
    }
}

fn load_offsets(path: &std::path::Path) -> Result<HashMap<String, u64>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| TellerError::Log(format!("corrupt offsets file {}: {e}", path.display())))
}

fn line_count(path: &std::path::Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().count() as u64)
}
