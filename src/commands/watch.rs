//! Watch mode: print device notifications and follow unplug/replug.
//!
//! Everything runs on one current-thread runtime, so the session is only
//! ever touched from the thread that owns it.

use anyhow::Context;
use futures::stream::{LocalBoxStream, StreamExt};
use kb390l::EventsConfig;
use kb390l_keyboard::SessionEvent;
use kb390l_transport::{MonitorEvent, TransportError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{CommandResult, Session};

/// Ticks to keep retrying an arrival whose HID interfaces are not ready yet
const ARRIVAL_RETRY_TICKS: u32 = 100;

fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Connected => "connected".to_string(),
        SessionEvent::Disconnected => "disconnected".to_string(),
        SessionEvent::Changed => "settings changed on the device".to_string(),
        SessionEvent::AdvancedCommand(index) => format!("advanced command {index}"),
    }
}

#[cfg(all(target_os = "linux", feature = "hotplug"))]
fn device_events() -> LocalBoxStream<'static, Result<MonitorEvent, TransportError>> {
    use kb390l_transport::protocol::device;
    use kb390l_transport::DeviceMonitor;

    match DeviceMonitor::new(device::VENDOR_ID, device::PRODUCT_ID) {
        Ok(monitor) => monitor.boxed_local(),
        Err(e) => {
            warn!("Hot-plug monitor unavailable: {}", e);
            futures::stream::pending().boxed_local()
        }
    }
}

#[cfg(not(all(target_os = "linux", feature = "hotplug")))]
fn device_events() -> LocalBoxStream<'static, Result<MonitorEvent, TransportError>> {
    futures::stream::pending().boxed_local()
}

/// Run until Ctrl-C
pub fn run(kb: Session, events: &EventsConfig) -> CommandResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the event loop")?;
    runtime.block_on(watch(kb, events.clone()))
}

async fn watch(mut kb: Session, events: EventsConfig) -> CommandResult {
    kb.subscribe(|event| println!("{}", describe(event)));

    if !kb.is_connected() && !kb.connect() {
        eprintln!("Waiting for the device...");
    }

    let mut monitor = device_events();
    let mut ticker = tokio::time::interval(events.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut arrival: Option<(String, u32)> = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }

            _ = ticker.tick() => {
                if let Some((locator, left)) = arrival.take() {
                    if !kb.on_arrival(&locator) && left > 0 {
                        arrival = Some((locator, left - 1));
                    }
                }
                if let Err(e) = kb.poll_events() {
                    warn!("Event endpoint failed, treating as removal: {}", e);
                    kb.on_removal();
                }
            }

            Some(event) = monitor.next() => match event {
                Ok(MonitorEvent::Arrival(locator)) => {
                    if !kb.is_connected() && !kb.on_arrival(&locator) {
                        debug!("Device at {} not ready yet", locator);
                        arrival = Some((locator, ARRIVAL_RETRY_TICKS));
                    }
                }
                Ok(MonitorEvent::Removal) => {
                    arrival = None;
                    kb.on_removal();
                }
                Err(e) => warn!("Device monitor error: {}", e),
            },
        }
    }

    if kb.unsaved_changes() {
        warn!("Discarding unsaved changes");
    }
    Ok(())
}
