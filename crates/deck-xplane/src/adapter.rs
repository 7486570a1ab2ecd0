//! The X-Plane simulator adapter.
//!
//! One UDP socket carries everything: subscription requests out, `RREF`
//! records in, command executions and dataref writes out. A single
//! receive task routes incoming records through the current subscription
//! router; `subscribe` atomically replaces the router, so records for a
//! previous aircraft's indices are dropped instead of misdelivered.

use crate::error::SimulatorError;
use crate::protocol::{
    RREF_FREQ_OFF, RrefRecord, encode_cmnd, encode_dref_write, encode_rref_request,
    is_rref_response, parse_rref_response,
};
use flight_deck_core::{
    SimulatorAdapter, SimulatorReport, SimulatorReportReceiver, SubscriptionSet, Value, ValueKind,
};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Dataref probed to confirm the simulator answers at all.
const LIVENESS_DATAREF: &str = "sim/time/total_running_time_sec";
const PROBE_INDEX: i32 = 0;
const SUBSCRIBE_FREQ_HZ: i32 = 10;
const REPORT_CHANNEL_CAPACITY: usize = 256;

/// Bounded-retry policy for establishing the simulator connection.
#[derive(Debug, Clone)]
pub struct ConnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_attempts: u32,
    pub probe_timeout: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
            max_attempts: 30,
            probe_timeout: Duration::from_secs(2),
        }
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// What a subscribed `RREF` index means.
#[derive(Debug)]
enum Slot {
    Number { name: String, last_bits: Option<u32> },
    Command { name: String, active: bool },
    TextElement { name: String, element: usize },
}

/// Reassembles a character-array dataref subscribed element-wise.
#[derive(Debug)]
struct TextAssembler {
    elements: Vec<Option<u8>>,
    last_emitted: Option<String>,
}

impl TextAssembler {
    fn new(len: usize) -> Self {
        Self {
            elements: vec![None; len],
            last_emitted: None,
        }
    }

    fn set(&mut self, element: usize, byte: u8) {
        if let Some(slot) = self.elements.get_mut(element) {
            *slot = Some(byte);
        }
    }

    /// The assembled string once every element has arrived and the value
    /// differs from the last emission.
    fn changed_text(&mut self) -> Option<String> {
        if self.elements.iter().any(Option::is_none) {
            return None;
        }
        let bytes: Vec<u8> = self
            .elements
            .iter()
            .map(|b| b.unwrap_or(0))
            .take_while(|b| *b != 0)
            .collect();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if self.last_emitted.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last_emitted = Some(text.clone());
        Some(text)
    }
}

/// Routes incoming records for the current subscription generation.
struct Router {
    slots: HashMap<i32, Slot>,
    assemblers: HashMap<String, TextAssembler>,
    tx: mpsc::Sender<SimulatorReport>,
}

impl Router {
    fn new(tx: mpsc::Sender<SimulatorReport>) -> Self {
        Self {
            slots: HashMap::new(),
            assemblers: HashMap::new(),
            tx,
        }
    }

    fn handle_records(&mut self, records: &[RrefRecord]) -> Vec<SimulatorReport> {
        let mut reports = Vec::new();
        for record in records {
            match self.slots.get_mut(&record.index) {
                // Stale index from a replaced subscription set.
                None => continue,
                Some(Slot::Number { name, last_bits }) => {
                    let bits = record.value.to_bits();
                    if *last_bits != Some(bits) {
                        *last_bits = Some(bits);
                        reports.push(SimulatorReport::value_change(
                            name.clone(),
                            f64::from(record.value),
                        ));
                    }
                }
                Some(Slot::Command { name, active }) => {
                    let now_active = record.value > 0.5;
                    if now_active && !*active {
                        reports.push(SimulatorReport::command_active(name.clone()));
                    }
                    *active = now_active;
                }
                Some(Slot::TextElement { name, element }) => {
                    let name = name.clone();
                    let element = *element;
                    if let Some(assembler) = self.assemblers.get_mut(&name) {
                        assembler.set(element, record.value as u8);
                        if let Some(text) = assembler.changed_text() {
                            reports
                                .push(SimulatorReport::value_change(name, Value::Text(text)));
                        }
                    }
                }
            }
        }
        reports
    }
}

/// Live connection to an X-Plane instance over UDP.
pub struct XPlaneAdapter {
    socket: Arc<UdpSocket>,
    router: Arc<Mutex<Option<Router>>>,
    subscribed: Mutex<Vec<(i32, String)>>,
    next_index: AtomicI32,
}

impl XPlaneAdapter {
    /// Bind, probe the simulator with bounded retry and backoff, and
    /// start the receive task.
    pub async fn connect(
        address: SocketAddr,
        policy: ConnectPolicy,
    ) -> Result<Self, SimulatorError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect(address).await?;
        let socket = Arc::new(socket);

        let probe = encode_rref_request(1, PROBE_INDEX, LIVENESS_DATAREF)?;
        let mut delay = policy.initial_backoff;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            socket.send(&probe).await?;
            let mut buf = [0u8; 2048];
            let answered = matches!(
                timeout(policy.probe_timeout, socket.recv(&mut buf)).await,
                Ok(Ok(len)) if is_rref_response(buf.get(..len).unwrap_or(&buf))
            );
            if answered {
                info!(%address, attempt, "connected to X-Plane");
                break;
            }
            if attempt >= policy.max_attempts {
                return Err(SimulatorError::ConnectFailed {
                    address: address.to_string(),
                    attempts: attempt,
                });
            }
            warn!(%address, attempt, "waiting for X-Plane");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(policy.max_backoff);
        }
        socket
            .send(&encode_rref_request(RREF_FREQ_OFF, PROBE_INDEX, LIVENESS_DATAREF)?)
            .await?;

        let router: Arc<Mutex<Option<Router>>> = Arc::new(Mutex::new(None));
        tokio::spawn(receive_loop(Arc::clone(&socket), Arc::clone(&router)));

        Ok(Self {
            socket,
            router,
            subscribed: Mutex::new(Vec::new()),
            next_index: AtomicI32::new(1),
        })
    }

    fn allocate_index(&self) -> i32 {
        self.next_index.fetch_add(1, Ordering::Relaxed)
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, router: Arc<Mutex<Option<Router>>>) {
    let mut buf = [0u8; 4096];
    loop {
        let len = match socket.recv(&mut buf).await {
            Ok(len) => len,
            Err(err) => {
                warn!(error = %err, "simulator receive failed, stopping");
                return;
            }
        };
        let data = buf.get(..len).unwrap_or(&buf);
        let records = match parse_rref_response(data) {
            Ok(records) => records,
            Err(err) => {
                debug!(error = %err, "ignoring non-RREF datagram");
                continue;
            }
        };
        // Route under the lock, send after releasing it.
        let (reports, tx) = {
            let mut guard = lock(&router);
            let Some(router) = guard.as_mut() else {
                continue;
            };
            (router.handle_records(&records), router.tx.clone())
        };
        for report in reports {
            if tx.send(report).await.is_err() {
                // Receiver dropped during a rebind; the router will be
                // replaced by the next subscribe call.
                break;
            }
        }
    }
}

#[async_trait]
impl SimulatorAdapter for XPlaneAdapter {
    async fn subscribe(&self, set: SubscriptionSet) -> Result<SimulatorReportReceiver> {
        // Retire the previous generation's indices first.
        let old: Vec<(i32, String)> = std::mem::take(&mut *lock(&self.subscribed));
        for (index, path) in &old {
            self.socket
                .send(&encode_rref_request(RREF_FREQ_OFF, *index, path)?)
                .await?;
        }

        let (tx, rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
        let mut router = Router::new(tx);
        let mut requests: Vec<(i32, String)> = Vec::new();

        for value in &set.values {
            match value.kind {
                ValueKind::Number => {
                    let index = self.allocate_index();
                    router.slots.insert(
                        index,
                        Slot::Number {
                            name: value.name.clone(),
                            last_bits: None,
                        },
                    );
                    requests.push((index, value.name.clone()));
                }
                ValueKind::Text { len } => {
                    router
                        .assemblers
                        .insert(value.name.clone(), TextAssembler::new(len));
                    for element in 0..len {
                        let index = self.allocate_index();
                        router.slots.insert(
                            index,
                            Slot::TextElement {
                                name: value.name.clone(),
                                element,
                            },
                        );
                        requests.push((index, format!("{}[{element}]", value.name)));
                    }
                }
            }
        }
        for command in &set.commands {
            let index = self.allocate_index();
            router.slots.insert(
                index,
                Slot::Command {
                    name: command.clone(),
                    active: false,
                },
            );
            requests.push((index, command.clone()));
        }

        for (index, path) in &requests {
            self.socket
                .send(&encode_rref_request(SUBSCRIBE_FREQ_HZ, *index, path)?)
                .await?;
        }
        debug!(subscriptions = requests.len(), "subscription set replaced");

        *lock(&self.subscribed) = requests;
        *lock(&self.router) = Some(router);
        Ok(rx)
    }

    async fn execute(&self, command: &str) -> Result<()> {
        self.socket.send(&encode_cmnd(command)?).await?;
        Ok(())
    }

    async fn set_value(&self, name: &str, value: &Value) -> Result<()> {
        let number = value
            .as_number()
            .ok_or_else(|| SimulatorError::UnsupportedWrite {
                name: name.to_string(),
            })?;
        self.socket
            .send(&encode_dref_write(number as f32, name)?)
            .await?;
        Ok(())
    }
}
