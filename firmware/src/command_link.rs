//! Line-oriented UART command link, the inbound path for relay commands.
//!
//! One command per line, terminated by CR or LF:
//!
//! ```text
//! set <sensor-id> on|off
//! ```
//!
//! Every accepted line is answered with `OK`, everything else with `ERR`.

use defmt_or_log as log;
use embassy_rp::uart::{Async, Uart};
use multirelay_logic::SensorId;

use crate::panel::PanelControl;

const LINE_CAPACITY: usize = 32;

pub async fn run(mut uart: Uart<'static, Async>, control: &PanelControl<'_>) -> ! {
    let mut line = [0u8; LINE_CAPACITY];
    let mut len = 0;
    let mut byte = [0u8; 1];

    loop {
        if uart.read(&mut byte).await.is_err() {
            continue;
        }

        if byte[0] == b'\r' || byte[0] == b'\n' {
            if len == 0 {
                continue;
            }
            match parse_set_command(&line[..len]) {
                Some((sensor_id, on)) => {
                    control.set_relay(sensor_id, on).await;
                    let _ = uart.write(b"OK\r\n").await;
                }
                None => {
                    log::warn!("unparseable command line ({} bytes)", len);
                    let _ = uart.write(b"ERR\r\n").await;
                }
            }
            len = 0;
        } else if len < line.len() {
            line[len] = byte[0];
            len += 1;
        } else {
            // Overlong line: drop it wholesale rather than act on a prefix.
            len = 0;
        }
    }
}

fn parse_set_command(line: &[u8]) -> Option<(SensorId, bool)> {
    let text = core::str::from_utf8(line).ok()?;
    let mut words = text.split_ascii_whitespace();
    if words.next()? != "set" {
        return None;
    }
    let sensor_id: SensorId = words.next()?.parse().ok()?;
    let on = match words.next()? {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }?;
    if words.next().is_some() {
        return None;
    }
    Some((sensor_id, on))
}
