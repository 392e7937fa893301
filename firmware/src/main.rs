//! RP2040 firmware for the multirelay controller.
//!
//! Binds the board's GPIOs to the configuration tables, restores persisted
//! relay states from flash and runs the control loop and telemetry as
//! embassy tasks.
#![no_std]
#![no_main]

mod board;
mod command_link;
mod flash_store;
mod panel;
mod telemetry;
mod units;

use defmt_or_log as log;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, Async, InterruptHandler as UartInterruptHandler, Uart};
use multirelay_logic::{ControllerBuilder, RelayConfig, RelayOptions};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::board::{BUTTONS, COMMAND_BAUD, RELAYS, RESET_PERSISTED_STATE};
use crate::flash_store::FlashStateStore;
use crate::panel::{PanelControl, PanelRunner, PanelService, PanelState};

bind_interrupts!(struct Uart0Irqs {
    UART0_IRQ => UartInterruptHandler<UART0>;
});

static PANEL_STATE: StaticCell<PanelState> = StaticCell::new();
static PANEL_CONTROL: StaticCell<PanelControl<'static>> = StaticCell::new();

/// Pin level that keeps a relay off before the controller takes over.
fn relay_idle_level(config: &RelayConfig) -> Level {
    if config.options.contains(RelayOptions::TRIGGER_HIGH) {
        Level::Low
    } else {
        Level::High
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    log::info!(
        "multirelay: {} buttons, {} relays",
        BUTTONS.len(),
        RELAYS.len()
    );

    let button_pins = [
        Input::new(p.PIN_2, Pull::Up),
        Input::new(p.PIN_3, Pull::Up),
        Input::new(p.PIN_4, Pull::Up),
        Input::new(p.PIN_5, Pull::Up),
        Input::new(p.PIN_6, Pull::Up),
        Input::new(p.PIN_7, Pull::Up),
    ];
    let relay_pins = [
        Output::new(p.PIN_16, relay_idle_level(&RELAYS[0])),
        Output::new(p.PIN_17, relay_idle_level(&RELAYS[1])),
        Output::new(p.PIN_18, relay_idle_level(&RELAYS[2])),
        Output::new(p.PIN_19, relay_idle_level(&RELAYS[3])),
        Output::new(p.PIN_20, relay_idle_level(&RELAYS[4])),
        Output::new(p.PIN_21, relay_idle_level(&RELAYS[5])),
    ];

    let mut builder = ControllerBuilder::new();
    for (config, pin) in BUTTONS.iter().zip(button_pins) {
        builder
            .add_button(*config, pin)
            .expect("button table exceeds capacity");
    }
    for (config, pin) in RELAYS.iter().zip(relay_pins) {
        builder
            .add_relay(*config, pin)
            .expect("relay table exceeds capacity");
    }

    let store = FlashStateStore::new(p.FLASH);
    let controller = match builder.build(store, RESET_PERSISTED_STATE) {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("board configuration rejected: {}", e);
            panic!("invalid board configuration");
        }
    };

    let panel_state = PANEL_STATE.init(PanelState::new());
    let (panel_runner, panel_control) = PanelService::new(panel_state, controller);
    let panel_control: &'static PanelControl = PANEL_CONTROL.init(panel_control);

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = COMMAND_BAUD;
    let uart = Uart::new(
        p.UART0, p.PIN_0, p.PIN_1, Uart0Irqs, p.DMA_CH0, p.DMA_CH1, uart_config,
    );

    log::info!("spawn panel runner task");
    spawner.spawn(panel_runner_task(panel_runner)).unwrap();
    log::info!("spawn telemetry task");
    spawner.spawn(telemetry_task(panel_control)).unwrap();
    log::info!("spawn command link task");
    spawner.spawn(command_link_task(uart, panel_control)).unwrap();
}

#[embassy_executor::task]
async fn panel_runner_task(runner: PanelRunner<'static>) -> ! {
    log::debug!("starting panel runner task...");
    runner.run().await
}

#[embassy_executor::task]
async fn telemetry_task(control: &'static PanelControl<'static>) -> ! {
    log::debug!("starting telemetry task...");
    telemetry::run(control).await
}

#[embassy_executor::task]
async fn command_link_task(uart: Uart<'static, Async>, control: &'static PanelControl<'static>) -> ! {
    log::debug!("starting command link task...");
    command_link::run(uart, control).await
}
