#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_time::{Instant, Timer};
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    gpio::{DriveMode, Flex, Level, Output, OutputConfig, Pull},
    i2c::master::{Config as I2cConfig, I2c},
    time::Rate,
    timer::timg::TimerGroup,
};
use log::{LevelFilter, info, warn};

use ds3231::Ds3231;
use timekeeper_core::{
    app::{ConnectDecision, SaveKind, TimekeeperApp, TimekeeperConfig},
    clock::hour12,
    state::{PersistedState, StateStore},
};
use timekeeper_hal_esp32::{
    clock::WallClock,
    storage::flash_state::FlashStateStore,
    wifi::{ApEvent, MacDisplay, SoftApConfig},
};
use tm1637::Tm1637;

#[path = "main/radio.rs"]
mod radio;

const AP_SSID: &str = "ESP32-Timekeeper";
const AP_PSK: &str = "timekeeper123";
const AP_CHANNEL: u8 = 6;
const AP_MAX_CONNECTIONS: u16 = 2;
const SOFT_AP: SoftApConfig = SoftApConfig::new(AP_SSID, AP_PSK, AP_CHANNEL, AP_MAX_CONNECTIONS);
// A shorter PSK would silently come up as an open network.
const _: () = assert!(AP_PSK.len() >= 8, "WPA2 requires a PSK of 8+ characters");

const I2C_FREQ_KHZ: u32 = 100;
const DISPLAY_BRIGHTNESS: u8 = 4;
const TICK_INTERVAL_MS: u64 = 1_000;
const DISPATCH_INTERVAL_MS: u64 = 100;
/// The RTC is provisioned with local wall time, so this is a log label,
/// not an applied offset.
const TIMEZONE_LABEL: &str = "IST";

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

fn commit_state(store: &mut Option<FlashStateStore>, state: &PersistedState) {
    let Some(store) = store.as_mut() else {
        return;
    };
    if let Err(err) = store.save(state) {
        warn!("state commit failed: {:?}; progress kept in memory", err);
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: timekeeper starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // DS3231 wiring: SDA=GPIO21, SCL=GPIO22.
    let i2c_config = I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQ_KHZ));
    let i2c = I2c::new(peripherals.I2C0, i2c_config)
        .unwrap()
        .with_sda(peripherals.GPIO21)
        .with_scl(peripherals.GPIO22);

    let mut wall_clock = WallClock::new(Ds3231::new(i2c));
    match wall_clock.seed() {
        Ok(reading) => {
            let t = reading.time;
            info!(
                "rtc: seeded {:04}-{:02}-{:02} {:02}:{:02}:{:02} {}",
                t.year, t.month, t.day, t.hour, t.minute, t.second, TIMEZONE_LABEL
            );
        }
        Err(err) => warn!("rtc seed read failed: {:?}", err),
    }
    match wall_clock.temperature() {
        Ok(temp) => {
            let centi = temp.centi_celsius();
            info!("rtc: temperature {}.{:02}C", centi / 100, (centi % 100).unsigned_abs());
        }
        Err(err) => warn!("rtc temperature read failed: {:?}", err),
    }

    // TM1637 wiring: CLK=GPIO18, DIO=GPIO19. DIO is bidirectional for the
    // ACK slot, so it runs open-drain with the pull-up.
    let tm_clk = Output::new(peripherals.GPIO18, Level::High, OutputConfig::default());
    let mut tm_dio = Flex::new(peripherals.GPIO19);
    tm_dio.apply_output_config(
        &OutputConfig::default()
            .with_drive_mode(DriveMode::OpenDrain)
            .with_pull(Pull::Up),
    );
    tm_dio.set_input_enable(true);
    tm_dio.set_output_enable(true);
    tm_dio.set_high();

    let mut delay = Delay::new();
    let mut display = Tm1637::new(tm_clk, tm_dio);
    esp_println::println!("display: init begin (CLK=18 DIO=19)");
    if let Err(err) = display.init(DISPLAY_BRIGHTNESS, &mut delay) {
        esp_println::println!("display: init failed");
        info!("display init failed: {:?}", err);
    } else {
        esp_println::println!("display: init ok");
    }

    let mut store = match FlashStateStore::new() {
        Ok(store) => Some(store),
        Err(err) => {
            warn!("state storage unavailable ({:?}); progress will be volatile", err);
            None
        }
    };
    let loaded = store.as_mut().and_then(|store| match store.load() {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!("state load failed: {:?}; starting fresh", err);
            None
        }
    });
    match &loaded {
        Some(state) => info!(
            "state restored: day={} remaining={}s started={} bound={}",
            state.day,
            state.remaining,
            state.started,
            if state.have_mac { "yes" } else { "no" }
        ),
        None => info!("no prior state; starting fresh"),
    }

    let app = RefCell::new(TimekeeperApp::new(TimekeeperConfig::default(), loaded));
    let store = RefCell::new(store);

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            loop {
                Timer::after_secs(1).await;
            }
        }
    };

    let (mut wifi_controller, _interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                loop {
                    Timer::after_secs(1).await;
                }
            }
        };

    radio::install_ap_event_handlers();

    if let Err(err) = radio::configure_access_point(&mut wifi_controller, &SOFT_AP) {
        info!("softap config failed: {:?}", err);
        loop {
            Timer::after_secs(1).await;
        }
    }
    if let Err(err) = wifi_controller.start_async().await {
        info!("softap start failed: {:?}", err);
        loop {
            Timer::after_secs(1).await;
        }
    }
    info!(
        "softap up: ssid={} channel={} max_connections={}",
        SOFT_AP.ssid, SOFT_AP.channel, SOFT_AP.max_connections
    );
    info!("Display pins: CLK=GPIO18 DIO=GPIO19");
    info!("RTC pins: SDA=GPIO21 SCL=GPIO22");

    let dispatch_future = async {
        loop {
            while let Some(event) = radio::AP_EVENTS.pop() {
                let now_ms = Instant::now().as_millis();
                match event {
                    ApEvent::StaConnected { mac, aid } => {
                        let outcome = app.borrow_mut().on_sta_connected(mac, aid, now_ms);
                        match outcome.decision {
                            ConnectDecision::Ignored => {
                                info!("sta {} aid={} ignored", MacDisplay(mac), aid);
                            }
                            ConnectDecision::CheckedIn { relearned } => info!(
                                "sta {} aid={} checked in{}",
                                MacDisplay(mac),
                                aid,
                                if relearned { " (address re-learned)" } else { "" }
                            ),
                            ConnectDecision::AlreadyCheckedIn => {
                                info!("sta {} aid={} reconnected", MacDisplay(mac), aid);
                            }
                        }
                        if outcome.save {
                            commit_state(&mut store.borrow_mut(), &app.borrow().persisted());
                        }
                        if let Some(due) = outcome.deauth_at_ms {
                            info!("deauth armed for aid={} in {}ms", aid, due.saturating_sub(now_ms));
                        }
                    }
                    ApEvent::StaDisconnected { mac, aid } => {
                        app.borrow_mut().on_sta_disconnected(mac, aid);
                        info!("sta {} aid={} disconnected", MacDisplay(mac), aid);
                    }
                }
            }

            let dropped = radio::AP_EVENTS.take_dropped();
            if dropped > 0 {
                warn!("ap event queue overflowed; dropped {} events", dropped);
            }

            let due_aid = app.borrow_mut().poll_deauth(Instant::now().as_millis());
            if let Some(aid) = due_aid {
                match radio::deauth_station(aid) {
                    Ok(()) => info!("deauthed aid={}", aid),
                    Err(rc) => warn!("deauth for aid={} failed: rc={}", aid, rc),
                }
            }

            Timer::after_millis(DISPATCH_INTERVAL_MS).await;
        }
    };

    let tick_future = async {
        let mut display_fault_logged = false;
        loop {
            let reading = match wall_clock.now_local() {
                Ok(reading) => Some(reading),
                Err(err) => {
                    warn!("clock read failed: {:?}", err);
                    None
                }
            };

            let outcome = app.borrow_mut().tick(reading);
            if outcome.rolled_over {
                info!("day rollover: countdown reset");
            }
            match outcome.save {
                SaveKind::None => {}
                SaveKind::Throttled | SaveKind::Immediate => {
                    commit_state(&mut store.borrow_mut(), &app.borrow().persisted());
                }
            }

            let frame = outcome.frame;
            if let Err(err) = display.show_hhmm(frame.hours, frame.minutes, frame.colon, &mut delay)
            {
                if !display_fault_logged {
                    info!("display write failed: {:?}", err);
                    display_fault_logged = true;
                }
            }

            match reading {
                Some(reading) => {
                    let t = reading.time;
                    let (h12, half) = hour12(t.hour);
                    info!(
                        "{:02}:{:02}:{:02} {} {:02}-{:02}-{:04} {} | {:02}:{:02} | {}",
                        h12,
                        t.minute,
                        t.second,
                        half,
                        t.day,
                        t.month,
                        t.year,
                        TIMEZONE_LABEL,
                        frame.hours,
                        frame.minutes,
                        outcome.phase.label()
                    );
                }
                // Clock unreadable: stamp from the soft reference so the log
                // stays legible, marked so nobody mistakes it for RTC time.
                None => match wall_clock.estimate() {
                    Ok(est) => {
                        let t = est.time;
                        let (h12, half) = hour12(t.hour);
                        info!(
                            "{:02}:{:02}:{:02} {} {:02}-{:02}-{:04} {} est | {:02}:{:02} | {}",
                            h12,
                            t.minute,
                            t.second,
                            half,
                            t.day,
                            t.month,
                            t.year,
                            TIMEZONE_LABEL,
                            frame.hours,
                            frame.minutes,
                            outcome.phase.label()
                        );
                    }
                    Err(_) => {
                        info!("--:--:-- (clock never read) | 00:00 | {}", outcome.phase.label());
                    }
                },
            }

            Timer::after_millis(TICK_INTERVAL_MS).await;
        }
    };

    let _ = embassy_futures::join::join(dispatch_future, tick_future).await;
    unreachable!()
}
