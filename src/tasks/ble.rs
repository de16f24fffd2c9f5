//! BLE task for the sensor transfer service
//!
//! Advertises the peripheral, serves one reader at a time and moves values
//! between the GATT server and the transfer engine.

use embassy_futures::select::{select, select3, Either3};
use embassy_time::{with_timeout, Duration, Timer};
use trouble_host::prelude::*;

use super::{BATTERY_LEVEL, ENGINE, PUBLISHER};
use crate::ble::Server;
use crate::config::device;
use crate::peripheral::signals::PendingValues;
use crate::peripheral::write::InboundWrite;

/// Number of maximum concurrent connections
const CONNECTIONS_MAX: usize = 1;
/// Number of L2CAP channels
const L2CAP_CHANNELS_MAX: usize = 2;

/// How a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Reader went away on its own
    Disconnected,
    /// Reader confirmed DONE and was disconnected by us
    Terminated,
}

/// Main BLE task that manages the Bluetooth stack and connections
///
/// This task:
/// 1. Initialises the BLE controller
/// 2. Advertises for `adv_duration` ms, then pauses `adv_interval_global` s
/// 3. Routes confirm and settings writes into the engine and settings
/// 4. Stores and notifies published values
/// 5. After a DONE confirm, disconnects and stays quiet before advertising again
///
/// Advertising is windowed, not continuous: each window lasts `adv_duration`
/// and is followed by an `adv_interval_global` pause. A reader that scans
/// during the pause waits for the next window.
pub async fn ble_task<C: Controller>(controller: C, address: [u8; 6]) {
    log::info!("BLE: Starting as '{}'", device::NAME);

    // Create BLE host resources
    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();

    let stack = trouble_host::new(controller, &mut resources).set_random_address(Address::random(address));

    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    // Create GATT server with GAP configuration
    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: device::NAME,
        appearance: &appearance::UNKNOWN,
    });
    let server: Server = match Server::new_with_config(gap) {
        Ok(s) => s,
        Err(_) => {
            log::error!("BLE: Failed to build GATT server");
            return;
        }
    };

    let runner_task = runner.run();

    let peripheral_task = async {
        let mut adv_data = [0u8; 31];
        let len = match AdStructure::encode_slice(
            &[
                AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                AdStructure::CompleteLocalName(device::NAME.as_bytes()),
            ],
            &mut adv_data,
        ) {
            Ok(l) => l,
            Err(_) => return,
        };

        loop {
            // Values published while no reader was connected
            store(&server, &PUBLISHER.take_pending());

            let settings = super::settings();
            let interval = Duration::from_micros(settings.adv_interval_local as u64 * 625);
            let params = AdvertisementParameters {
                interval_min: interval,
                interval_max: interval,
                ..Default::default()
            };

            log::debug!("BLE: Advertising...");
            let advertiser = match peripheral
                .advertise(
                    &params,
                    Advertisement::ConnectableScannableUndirected {
                        adv_data: &adv_data[..len],
                        scan_data: &[],
                    },
                )
                .await
            {
                Ok(a) => a,
                Err(_) => {
                    Timer::after_secs(1).await;
                    continue;
                }
            };

            // Wait for a connection for one advertising window
            let window = Duration::from_millis(settings.adv_duration_ms as u64);
            let acceptor = match with_timeout(window, advertiser.accept()).await {
                Ok(Ok(a)) => a,
                Ok(Err(_)) => continue,
                Err(_) => {
                    Timer::after_secs(settings.adv_interval_global_s as u64).await;
                    continue;
                }
            };

            let conn = match acceptor.with_attribute_server(&*server) {
                Ok(c) => c,
                Err(_) => continue,
            };

            log::info!("BLE: Reader connected");
            let _ = ENGINE.on_log_message(super::now_us(), "Reader connected");

            if serve_connection(&server, &conn).await == SessionEnd::Terminated {
                let quiet = super::settings().adv_interval_global_s;
                log::info!("BLE: Session ended, radio quiet for {} s", quiet);
                Timer::after_secs(quiet as u64).await;
            }
        }
    };

    select(runner_task, peripheral_task).await;
}

/// Handle GATT traffic and publications for one connection
async fn serve_connection(server: &Server<'_>, conn: &GattConnection<'_, '_, DefaultPacketPool>) -> SessionEnd {
    // Bring the table up to date before the reader's first read
    let pending = PUBLISHER.take_pending();
    store(server, &pending);
    if let Some(level) = BATTERY_LEVEL.try_take() {
        server.publish_battery(None, level).await;
    }

    loop {
        match select3(conn.next(), PUBLISHER.wait_changed(), BATTERY_LEVEL.wait()).await {
            Either3::First(GattConnectionEvent::Disconnected { reason: _ }) => {
                log::info!("BLE: Disconnected");
                return SessionEnd::Disconnected;
            }
            Either3::First(GattConnectionEvent::Gatt { event }) => match event {
                GattEvent::Write(write_event) => {
                    let handle = write_event.handle();

                    if handle == server.transfer.confirm.handle {
                        ENGINE.on_confirm_write(&InboundWrite::remote(write_event.data()));

                        // Next chunk must be readable once the write is acknowledged
                        let pending = PUBLISHER.take_pending();
                        store(server, &pending);
                        let _ = write_event.accept();
                        server.notify_pending(conn, &pending).await;

                        if pending.terminate {
                            conn.raw().disconnect();
                            return SessionEnd::Terminated;
                        }
                    } else if let Some(field) = server.setting_for_handle(handle) {
                        let write = InboundWrite::remote(write_event.data());
                        super::update_settings(|settings| settings.apply(field, &write));
                        let _ = write_event.accept();

                        // Stored value follows the setting, not the raw write
                        if server.echo_setting(field, &super::settings()).is_err() {
                            log::warn!("BLE: Failed to store setting {:?}", field);
                        }
                    } else {
                        let _ = write_event.accept();
                    }
                }
                GattEvent::Read(read_event) => {
                    let _ = read_event.accept();
                }
                GattEvent::Other(other_event) => {
                    let _ = other_event.accept();
                }
            },
            Either3::First(_) => {}
            Either3::Second(()) => {
                let pending = PUBLISHER.take_pending();
                store(server, &pending);
                server.notify_pending(conn, &pending).await;
            }
            Either3::Third(level) => {
                server.publish_battery(Some(conn), level).await;
            }
        }
    }
}

/// Write published values into the attribute table
fn store(server: &Server<'_>, pending: &PendingValues) {
    if let Err(e) = server.store_pending(pending) {
        log::warn!("BLE: Failed to store published values: {:?}", e);
    }
}
