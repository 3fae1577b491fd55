#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack};
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::{WifiController, WifiDevice};
use log::{error, info};
use static_cell::StaticCell;

use meteo_core::config::{Config, InternetConfig};
use meteo_core::reading::ReadingPublisher;
use meteo_core::sampling;
use meteo_core::sensors::Bme280;
use meteo_firmware::hardware::{self, SensorBus};
use meteo_firmware::{WIFI_PASSWORD, WIFI_SSID, http_server, wifi};

type Station = Bme280<'static, SensorBus, Delay>;

const INIT_RETRY_MIN: Duration = Duration::from_secs(1);
const INIT_RETRY_MAX: Duration = Duration::from_secs(30);

/// Latest calibrated reading, written by the sampling task and read by HTTP.
static PUBLISHER: ReadingPublisher = ReadingPublisher::new();

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn sampling_task(mut station: Station, interval: Duration) -> ! {
    let mut backoff = INIT_RETRY_MIN;
    while let Err(e) = station.init().await {
        error!("BME280 init failed ({}), retrying in {} s", e, backoff.as_secs());
        Timer::after(backoff).await;
        backoff = (backoff * 2).min(INIT_RETRY_MAX);
    }

    sampling::run(&mut station, interval).await
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn connection_task(
    controller: WifiController<'static>,
    internet: InternetConfig<'static>,
) -> ! {
    wifi::maintain_connection(controller, internet).await
}

#[embassy_executor::task]
async fn http_task(stack: Stack<'static>) -> ! {
    wifi::wait_for_address(stack).await;
    http_server::serve(stack, &PUBLISHER).await
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let config = Config {
        internet: InternetConfig {
            ssid: WIFI_SSID,
            password: WIFI_PASSWORD,
        },
        ..Config::default()
    };

    let bus = hardware::init_sensor_bus(
        peripherals.I2C0,
        peripherals.GPIO21,
        peripherals.GPIO22,
        &config.bus,
    )
    .expect("Failed to initialize I2C bus");
    let station = Bme280::new(
        hardware::sensor_device(bus, &config.bus),
        Delay,
        &PUBLISHER,
    );

    let radio = RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (wifi_controller, interfaces) =
        esp_radio::wifi::new(radio, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let (stack, runner) = wifi::init_stack(interfaces.sta, seed);

    spawner.spawn(
        sampling_task(station, config.sampling.interval()).expect("sampling task already running"),
    );
    spawner.spawn(net_task(runner).expect("network task already running"));
    spawner.spawn(
        connection_task(wifi_controller, config.internet).expect("WiFi task already running"),
    );
    spawner.spawn(http_task(stack).expect("HTTP task already running"));

    loop {
        Timer::after(Duration::from_secs(60)).await;
        let snapshot = PUBLISHER.snapshot();
        info!("{} readings published, latest: {}", snapshot.sequence, snapshot.reading);
    }
}
