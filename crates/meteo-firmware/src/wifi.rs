//! WiFi station link
//!
//! Joins the configured network in station mode and re-joins whenever the
//! access point drops us. The network stack gets its address over DHCP.

use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{
    ClientConfig, ModeConfig, WifiController, WifiDevice, WifiError, WifiEvent, WifiStaState,
};
use log::{info, warn};
use meteo_core::config::InternetConfig;
use static_cell::StaticCell;

/// Sockets: the HTTP listener, DHCP and one spare.
const SOCKET_COUNT: usize = 3;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

static RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();

/// Build the DHCP-configured stack on top of the station interface.
pub fn init_stack(
    device: WifiDevice<'static>,
    seed: u64,
) -> (Stack<'static>, Runner<'static, WifiDevice<'static>>) {
    let config = embassy_net::Config::dhcpv4(Default::default());
    embassy_net::new(
        device,
        config,
        RESOURCES.init(StackResources::new()),
        seed,
    )
}

async fn start(
    controller: &mut WifiController<'static>,
    internet: &InternetConfig<'static>,
) -> Result<(), WifiError> {
    let client = ClientConfig::default()
        .with_ssid(internet.ssid.into())
        .with_password(internet.password.into());
    controller.set_config(&ModeConfig::Client(client))?;
    controller.start_async().await?;
    info!("WiFi started, joining \"{}\"", internet.ssid);
    Ok(())
}

/// Keep the station associated forever.
pub async fn maintain_connection(
    mut controller: WifiController<'static>,
    internet: InternetConfig<'static>,
) -> ! {
    loop {
        if matches!(esp_radio::wifi::sta_state(), WifiStaState::Connected) {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("WiFi link lost");
            Timer::after(RECONNECT_DELAY).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            if let Err(e) = start(&mut controller, &internet).await {
                warn!("Failed to start WiFi: {:?}", e);
                Timer::after(RECONNECT_DELAY).await;
                continue;
            }
        }

        match controller.connect_async().await {
            Ok(()) => info!("WiFi connected"),
            Err(e) => {
                warn!("Failed to join \"{}\": {:?}", internet.ssid, e);
                Timer::after(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Block until DHCP has handed out an address and log it.
pub async fn wait_for_address(stack: Stack<'static>) {
    stack.wait_config_up().await;
    if let Some(config) = stack.config_v4() {
        info!("Station address: http://{}/", config.address.address());
    }
}
