//! The MCDU device adapter.
//!
//! Raw HID traffic is read on a blocking task and turned into device
//! reports: key-press reports on press edges, and an ambient light value
//! report when the unit's light sensors move past a threshold. Commands
//! write LED, brightness, and display frames back to the unit.

use super::display::Page;
use super::protocol::{
    self, ACK_REPORT_LEN, BrightnessChannel, INPUT_REPORT_LEN, InputFrame, Led,
};
use crate::error::DeviceError;
use flight_deck_core::{DeviceAdapter, DeviceCommand, DeviceDescriptor, DeviceReport, Value};
use anyhow::Result;
use async_trait::async_trait;
use hidapi::HidDevice;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Report name for the ambient light sensor value stream.
pub const AMBIENT_LIGHT_VALUE: &str = "AmbientLight";

/// Sensor movement below this raw delta is noise.
const SENSOR_DELTA: i32 = 200;
const READ_TIMEOUT_MS: i32 = 100;
const REPORT_CHANNEL_CAPACITY: usize = 100;

fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    // A poisoned lock only means another reader/writer panicked; the
    // guarded HID handle itself is still usable.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Adapter for one attached WinWing MCDU unit.
pub struct McduAdapter {
    descriptor: DeviceDescriptor,
    device: Arc<Mutex<HidDevice>>,
    page: Arc<Mutex<Page>>,
}

impl McduAdapter {
    pub fn new(descriptor: DeviceDescriptor, device: HidDevice) -> Self {
        Self {
            descriptor,
            device: Arc::new(Mutex::new(device)),
            page: Arc::new(Mutex::new(Page::blank())),
        }
    }

    /// Quiesce the unit: annunciators off, blank display.
    pub async fn initialize(&self) -> Result<()> {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || -> Result<(), DeviceError> {
            let device = lock(&device);
            for led in Led::ALL {
                device.write(&protocol::led_frame(*led, false))?;
            }
            for frame in Page::blank().to_frames() {
                device.write(&frame)?;
            }
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn write_frames(&self, frames: Vec<[u8; 64]>) -> Result<()> {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || -> Result<(), DeviceError> {
            let device = lock(&device);
            for frame in &frames {
                device.write(frame)?;
            }
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn write_control(&self, frame: [u8; 14]) -> Result<()> {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || -> Result<(), DeviceError> {
            lock(&device).write(&frame)?;
            Ok(())
        })
        .await??;
        Ok(())
    }
}

#[async_trait]
impl DeviceAdapter for McduAdapter {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    async fn start_reports(&self) -> Result<flight_deck_core::DeviceReportReceiver> {
        let (tx, rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
        let device = Arc::clone(&self.device);
        let model = self.descriptor.model.clone();

        tokio::task::spawn_blocking(move || {
            reader_loop(&device, &model, &tx);
        });

        Ok(rx)
    }

    async fn apply(&self, command: DeviceCommand) -> Result<()> {
        match command {
            DeviceCommand::SetValue { name, value } => {
                let channel = BrightnessChannel::from_name(&name)
                    .ok_or(DeviceError::UnknownValueChannel(name))?;
                let level = protocol::brightness_level(value.as_number().unwrap_or(0.0));
                self.write_control(protocol::brightness_frame(channel, level))
                    .await
            }
            DeviceCommand::SetLed { name, on } => {
                let led = Led::from_name(&name).ok_or(DeviceError::UnknownLed(name))?;
                self.write_control(protocol::led_frame(led, on)).await
            }
            DeviceCommand::RefreshDisplay => {
                let frames = lock(&self.page).to_frames();
                self.write_frames(frames).await
            }
            DeviceCommand::ShowStatus { text } => {
                let page = Page::status_screen(&text);
                let frames = page.to_frames();
                *lock(&self.page) = page;
                self.write_frames(frames).await
            }
        }
    }
}

/// Blocking HID read loop. Runs until the channel closes or the device
/// read fails hard; both end the stream, which the coordinator treats as
/// an unrecoverable device failure.
fn reader_loop(device: &Mutex<HidDevice>, model: &str, tx: &mpsc::Sender<DeviceReport>) {
    let mut buf = [0u8; INPUT_REPORT_LEN];
    let mut last_frame: Option<InputFrame> = None;

    loop {
        let read = lock(device).read_timeout(&mut buf, READ_TIMEOUT_MS);
        let len = match read {
            Ok(len) => len,
            Err(err) => {
                warn!(model, error = %err, "device read failed, stopping report loop");
                return;
            }
        };
        if len == 0 || len == ACK_REPORT_LEN {
            // Timeout or LED acknowledgement frame.
            continue;
        }
        let frame = match protocol::parse_input_report(buf.get(..len).unwrap_or(&buf), model) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(model, error = %err, "ignoring malformed input report");
                continue;
            }
        };

        let Some(previous) = last_frame else {
            // First frame only seeds the key state; the unit replays
            // stale bits right after opening.
            last_frame = Some(frame);
            continue;
        };

        for (key, pressed) in protocol::key_transitions(previous.key_mask, frame.key_mask) {
            if !pressed {
                continue;
            }
            if tx.blocking_send(DeviceReport::key_press(key)).is_err() {
                debug!(model, "report receiver dropped, stopping reader");
                return;
            }
        }

        let left_delta = i32::from(frame.ambient_left) - i32::from(previous.ambient_left);
        let right_delta = i32::from(frame.ambient_right) - i32::from(previous.ambient_right);
        let mut next = previous;
        next.key_mask = frame.key_mask;
        if left_delta.abs() > SENSOR_DELTA || right_delta.abs() > SENSOR_DELTA {
            let average = f64::from(frame.ambient_left.midpoint(frame.ambient_right));
            if tx
                .blocking_send(DeviceReport::value_change(
                    AMBIENT_LIGHT_VALUE,
                    Value::Number(average),
                ))
                .is_err()
            {
                return;
            }
            next.ambient_left = frame.ambient_left;
            next.ambient_right = frame.ambient_right;
        }
        last_frame = Some(next);
    }
}
