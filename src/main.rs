#![no_std]
#![no_main]

extern crate alloc;

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use sensor_buffer_peripheral::tasks;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

/// Type alias for the BLE controller
type BleController = trouble_host::prelude::ExternalController<
    esp_radio::ble::controller::BleConnector<'static>,
    10,
>;

#[esp_hal::main]
fn main() -> ! {
    // Heap backs both the BLE stack and the sensor data log
    esp_alloc::heap_allocator!(size: 192 * 1024);

    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Random static address derived from the eFuse MAC
    let mac = esp_hal::efuse::Efuse::read_base_mac_address();
    let address: [u8; 6] = [mac[3], mac[4], mac[5], 0x5E, 0x45, 0xC5];

    // Initialise esp-radio for BLE support (must be after esp_rtos::start)
    let radio_controller = RADIO_CONTROLLER.init(
        esp_radio::init().expect("Failed to initialize esp-radio")
    );

    // Create BLE connector (ownership is passed to ExternalController)
    let ble_connector = esp_radio::ble::controller::BleConnector::new(
        radio_controller,
        peripherals.BT,
        esp_radio::ble::Config::default(),
    ).expect("Failed to initialize BLE connector");

    // Wrap in ExternalController for trouble-host compatibility
    let controller: BleController = trouble_host::prelude::ExternalController::new(ble_connector);

    log::info!("Sensor peripheral starting");

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, controller, address));
    })
}

#[embassy_executor::task]
async fn async_main(spawner: Spawner, ble_controller: BleController, address: [u8; 6]) {
    spawner.must_spawn(ble_host_task(ble_controller, address));
    spawner.must_spawn(sampler_task(Rng::new()));
    spawner.must_spawn(battery_task(Rng::new()));
}

/// Task that manages BLE connectivity
///
/// This task handles advertising, connections and the transfer service.
#[embassy_executor::task]
async fn ble_host_task(controller: BleController, address: [u8; 6]) {
    tasks::ble_task(controller, address).await;
}

/// Task that produces sensor bursts into the data log
#[embassy_executor::task]
async fn sampler_task(rng: Rng) {
    tasks::sampler_task(rng).await;
}

/// Task that drains the simulated battery
#[embassy_executor::task]
async fn battery_task(rng: Rng) {
    tasks::battery_task(rng).await;
}
