#![allow(dead_code)]
//! Test helpers for running the relay against mock upstreams.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, TimeZone};
use prowl_relay::{
    config::{Config, ElasticsearchConfig, Period},
    core::Clock,
    dispatch::Dispatcher,
    event_log::EventLog,
    server::RelayServer,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{net::TcpListener, sync::watch, task::JoinHandle, time::timeout};
use wiremock::MockServer;

/// A clock frozen at one moment.
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// 2023-11-14 at the given UTC time of day.
    pub fn at(hour: u32, minute: u32) -> Arc<Self> {
        Self::at_second(hour, minute, 0)
    }

    pub fn at_second(hour: u32, minute: u32, second: u32) -> Arc<Self> {
        let moment = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2023, 11, 14, hour, minute, second)
            .unwrap();
        Arc::new(Self(moment))
    }

    /// The given unix time, seen from a zone `offset_hours` east of UTC.
    pub fn at_unix(seconds: i64, offset_hours: i32) -> Arc<Self> {
        let moment = FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .timestamp_opt(seconds, 0)
            .unwrap();
        Arc::new(Self(moment))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// An event log that keeps everything it is given.
#[derive(Default)]
pub struct RecordingEventLog {
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingEventLog {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl EventLog for RecordingEventLog {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Builds a configuration pointed at a mock Prowl server.
pub fn config_for(prowl: &MockServer) -> Config {
    Config {
        token: "test-token".to_string(),
        host: "h1".to_string(),
        prowl_url: format!("{}/publicapi/add", prowl.uri()),
        ignore: vec![Period::new(2200, 2359)],
        ..Config::default()
    }
}

/// Adds a mirror store to a configuration.
pub fn with_mirror(mut config: Config, url: String) -> Config {
    config.elastic_search = Some(ElasticsearchConfig { url });
    config
}

/// Returns an address nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Represents a running relay for testing purposes.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub event_log: Arc<RecordingEventLog>,
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestRelay {
    /// Starts a relay on an ephemeral port with a frozen clock.
    pub async fn start(config: Config, clock: Arc<FixedClock>) -> Result<Self> {
        let event_log = Arc::new(RecordingEventLog::default());
        let dispatcher = Dispatcher::builder(Arc::new(config))
            .clock_override(clock)
            .event_log_override(event_log.clone())
            .build()?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let handle = tokio::spawn(RelayServer::new(listener, Arc::new(dispatcher), shutdown_rx).run());

        Ok(Self {
            addr,
            event_log,
            shutdown_tx,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Sends a GET to the relay and returns the status code.
    pub async fn get(&self, path: &str) -> Result<u16> {
        let response = reqwest::get(self.url(path)).await?;
        Ok(response.status().as_u16())
    }

    /// Shuts the relay down and waits for it to terminate.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown_tx.send(())?;
        timeout(Duration::from_secs(5), self.handle).await???;
        Ok(())
    }
}
