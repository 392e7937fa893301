//! Publishes controller reports. This is where a gateway link would hang
//! off; for now every report goes to the log.

use defmt_or_log as log;
use multirelay_logic::{ButtonAction, Report};

use crate::panel::PanelControl;

pub async fn run(control: &PanelControl<'_>) -> ! {
    loop {
        match control.receive_report().await {
            Report::ButtonAction { sensor_id, action } => {
                log::info!("sensor {}: {}", sensor_id, action_name(action));
            }
            Report::RelayState { sensor_id, on } => {
                log::info!("relay {}: {}", sensor_id, if on { "on" } else { "off" });
            }
        }
    }
}

fn action_name(action: ButtonAction) -> &'static str {
    match action {
        ButtonAction::ShortClick => "click",
        ButtonAction::DoubleClick => "double click",
        ButtonAction::LongClick => "long press",
        ButtonAction::None => "none",
    }
}
