//! # Raspberry Pi Edge Source
//!
//! Edge events from a Raspberry Pi GPIO pin using `rppal` asynchronous
//! interrupts. rppal reports only the new level, so each event is stamped
//! here with a microsecond tick taken from a monotonic clock and truncated to
//! 32 bits, which matches the wrap-around behaviour of the pigpio tick.
//!
//! The tick is read on rppal's interrupt thread after the kernel has
//! delivered the event, not latched by hardware. Scheduling jitter on a busy
//! system can exceed the 20 to 40 µs margins between DHT22 bit classes, in
//! which case frames end up as invalid bits or checksum errors in
//! `DecoderStats`. The water meter's one second debounce is not affected.
//!
//! ```rust,no_run
//! use homemeter_rs::gpio::{EdgeKind, EdgeSource, RppalEdgeSource};
//!
//! # async fn demo() -> Result<(), homemeter_rs::MeterError> {
//! let mut source = RppalEdgeSource::open(17, EdgeKind::Either, true)?;
//! while let Some(edge) = source.next_edge().await? {
//!     println!("tick={} level={}", edge.tick, edge.level);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::MeterError;
use crate::gpio::edge::{ChannelEdgeSource, EdgeEvent, EdgeKind, EdgeSource};
use async_trait::async_trait;
use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// How long the data line is held low to wake a DHT22.
const DHT_START_PULSE: Duration = Duration::from_millis(1);

fn gpio_err(e: rppal::gpio::Error) -> MeterError {
    MeterError::GpioError(e.to_string())
}

/// Interrupt-driven edge source on one BCM pin.
pub struct RppalEdgeSource {
    gpio: Gpio,
    pin_number: u8,
    edge: EdgeKind,
    pull_down: bool,
    epoch: Instant,
    tx: mpsc::UnboundedSender<EdgeEvent>,
    events: ChannelEdgeSource,
    pin: Option<InputPin>,
}

impl RppalEdgeSource {
    /// Opens `pin` (BCM numbering) and starts reporting edges of kind `edge`.
    pub fn open(pin: u8, edge: EdgeKind, pull_down: bool) -> Result<Self, MeterError> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let (tx, events) = ChannelEdgeSource::channel();

        let mut source = RppalEdgeSource {
            gpio,
            pin_number: pin,
            edge,
            pull_down,
            epoch: Instant::now(),
            tx,
            events,
            pin: None,
        };
        source.arm()?;
        log::info!("Watching GPIO {pin} for {edge:?} edges");
        Ok(source)
    }

    fn arm(&mut self) -> Result<(), MeterError> {
        let pin = self.gpio.get(self.pin_number).map_err(gpio_err)?;
        let mut pin = if self.pull_down {
            pin.into_input_pulldown()
        } else {
            pin.into_input()
        };

        let trigger = match self.edge {
            EdgeKind::Rising => Trigger::RisingEdge,
            EdgeKind::Falling => Trigger::FallingEdge,
            EdgeKind::Either => Trigger::Both,
        };

        let tx = self.tx.clone();
        let epoch = self.epoch;
        let pin_number = self.pin_number;
        pin.set_async_interrupt(trigger, move |level| {
            let tick = epoch.elapsed().as_micros() as u32;
            let event = EdgeEvent::new(tick, level == Level::High);
            if tx.send(event).is_err() {
                log::warn!("GPIO event channel closed for pin {pin_number}");
            }
        })
        .map_err(gpio_err)?;

        self.pin = Some(pin);
        Ok(())
    }
}

#[async_trait]
impl EdgeSource for RppalEdgeSource {
    async fn next_edge(&mut self) -> Result<Option<EdgeEvent>, MeterError> {
        self.events.next_edge().await
    }

    /// Pulls the line low for 1 ms and releases it, which makes a DHT22
    /// transmit one frame.
    async fn start_measurement(&mut self) -> Result<(), MeterError> {
        // Dropping the input pin clears its interrupt and frees the line
        self.pin = None;

        let mut out = self
            .gpio
            .get(self.pin_number)
            .map_err(gpio_err)?
            .into_output();
        out.set_low();
        tokio::time::sleep(DHT_START_PULSE).await;
        drop(out);

        self.arm()
    }
}
