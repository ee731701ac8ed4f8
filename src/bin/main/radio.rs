//! SoftAP bring-up, radio event callbacks, and the deauth control call.

use core::sync::atomic::{AtomicBool, Ordering};

use esp_radio::wifi::{
    ApConfig, AuthMethod, ModeConfig, WifiController, WifiError,
    event::{self, EventExt},
};
use timekeeper_hal_esp32::wifi::{ApEvent, ApEventQueue, SoftApConfig};

/// Filled by the radio callbacks, drained by the dispatch loop.
pub static AP_EVENTS: ApEventQueue = ApEventQueue::new();

static HANDLERS_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Routes station connect/disconnect callbacks into `AP_EVENTS`. The
/// callbacks run on the driver's context, so they only enqueue.
pub fn install_ap_event_handlers() {
    if HANDLERS_INSTALLED.swap(true, Ordering::Relaxed) {
        return;
    }

    event::ApStaconnected::update_handler(|event| {
        AP_EVENTS.push(ApEvent::StaConnected {
            mac: event.mac(),
            aid: u16::from(event.aid()),
        });
    });
    event::ApStadisconnected::update_handler(|event| {
        AP_EVENTS.push(ApEvent::StaDisconnected {
            mac: event.mac(),
            aid: u16::from(event.aid()),
        });
    });
}

pub fn configure_access_point(
    controller: &mut WifiController<'_>,
    config: &SoftApConfig,
) -> Result<(), WifiError> {
    let ap_config = ApConfig::default()
        .with_ssid(config.ssid.into())
        .with_password(config.psk.into())
        .with_auth_method(AuthMethod::Wpa2Personal)
        .with_channel(config.channel)
        .with_max_connections(config.max_connections);
    controller.set_config(&ModeConfig::AccessPoint(ap_config))
}

/// Forcibly disconnects a station by association id. The safe radio API
/// does not surface this, so it goes through the driver call directly.
pub fn deauth_station(aid: u16) -> Result<(), i32> {
    let rc = unsafe { esp_wifi_sys::include::esp_wifi_deauth_sta(aid) };
    if rc == 0 { Ok(()) } else { Err(rc) }
}
