//! The panel service: owns the controller and runs the tick loop.
//!
//! Split into a runner (owns the hardware-facing controller, runs forever)
//! and a control handle (feeds commands in, takes reports out), wired
//! through channels living in a static [`PanelState`].

use defmt_or_log as log;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Output};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Instant, Ticker};
use multirelay_logic::{Controller, Report, SensorId};

use crate::board::TICK_PERIOD_MS;
use crate::flash_store::FlashStateStore;
use crate::units::TimeExt;

const COMMAND_QUEUE_SIZE: usize = 4;
const REPORT_QUEUE_SIZE: usize = 16;

/// The controller as instantiated on this board.
pub type BoardController =
    Controller<Input<'static>, Output<'static>, FlashStateStore<'static>>;

#[derive(Debug, defmt::Format)]
pub enum PanelCommand {
    SetRelay { sensor_id: SensorId, on: bool },
}

type CommandChannel = Channel<CriticalSectionRawMutex, PanelCommand, COMMAND_QUEUE_SIZE>;
type ReportChannel = Channel<CriticalSectionRawMutex, Report, REPORT_QUEUE_SIZE>;

pub struct PanelState {
    commands: CommandChannel,
    reports: ReportChannel,
}

impl PanelState {
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            reports: Channel::new(),
        }
    }
}

pub struct PanelRunner<'a> {
    controller: BoardController,
    commands: Receiver<'a, CriticalSectionRawMutex, PanelCommand, COMMAND_QUEUE_SIZE>,
    reports: Sender<'a, CriticalSectionRawMutex, Report, REPORT_QUEUE_SIZE>,
}

pub struct PanelControl<'a> {
    commands: Sender<'a, CriticalSectionRawMutex, PanelCommand, COMMAND_QUEUE_SIZE>,
    reports: Receiver<'a, CriticalSectionRawMutex, Report, REPORT_QUEUE_SIZE>,
}

#[derive(Debug, Copy, Clone)]
pub struct PanelService(());

impl PanelService {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(
        state: &PanelState,
        controller: BoardController,
    ) -> (PanelRunner<'_>, PanelControl<'_>) {
        (
            PanelRunner {
                controller,
                commands: state.commands.receiver(),
                reports: state.reports.sender(),
            },
            PanelControl {
                commands: state.commands.sender(),
                reports: state.reports.receiver(),
            },
        )
    }
}

impl PanelRunner<'_> {
    fn now_ms() -> u32 {
        Instant::now().as_millis() as u32
    }

    fn handle_command(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::SetRelay { sensor_id, on } => {
                match self.controller.set_relay(sensor_id, on, Self::now_ms()) {
                    Ok(changed) => {
                        log::debug!("relay {} commanded to {} (changed: {})", sensor_id, on, changed)
                    }
                    Err(e) => log::warn!("command rejected: {}", e),
                }
            }
        }
    }

    fn push_report(&self, report: Report) {
        if self.reports.is_full() {
            // Telemetry stalled; newest state beats a backlog.
            self.reports.clear();
        }
        if self.reports.try_send(report).is_err() {
            log::error!("failed to queue report");
        }
    }

    pub async fn run(mut self) -> ! {
        let mut ticker = Ticker::every(TICK_PERIOD_MS.ms());
        loop {
            match select(self.commands.receive(), ticker.next()).await {
                Either::First(command) => self.handle_command(command),
                Either::Second(()) => {}
            }
            let now = Self::now_ms();
            for report in self.controller.tick(now) {
                self.push_report(report);
            }
        }
    }
}

impl PanelControl<'_> {
    /// Hand the panel an externally sourced relay command.
    pub async fn set_relay(&self, sensor_id: SensorId, on: bool) {
        self.commands
            .send(PanelCommand::SetRelay { sensor_id, on })
            .await
    }

    pub async fn receive_report(&self) -> Report {
        self.reports.receive().await
    }
}
