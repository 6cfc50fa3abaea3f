use bitflags::bitflags;

use crate::{Error, Result};

/// Reset the instrument to its default settings.
pub const CMD_RESET: &str = "*RST";

/// Clear the event registers and the error queue.
pub const CMD_CLEAR_STATUS: &str = "*CLS";

/// Generate a bus trigger event.
pub const CMD_TRIGGER: &str = "*TRG";

/// Hold off execution of further commands until all pending ones are complete.
pub const CMD_WAIT: &str = "*WAI";

pub const QUERY_IDENTIFY: &str = "*IDN?";

/// Read and clear the Standard Event Status Register.
pub const QUERY_EVENT_STATUS: &str = "*ESR?";

/// Pop the oldest entry off the error queue. SCPI, not IEEE 488.2, but every instrument that
/// speaks one speaks the other.
pub const QUERY_SYSTEM_ERROR: &str = "SYST:ERR?";

bitflags! {
    /// Standard Event Status Register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventStatus: u8 {
        /// Operation Complete
        const OPC = 1<<0;
        /// Request Control
        const RQC = 1<<1;
        /// Query Error
        const QYE = 1<<2;
        /// Device Dependent Error
        const DDE = 1<<3;
        /// Execution Error
        const EXE = 1<<4;
        /// Command Error
        const CME = 1<<5;
        /// User Request
        const URQ = 1<<6;
        /// Power On
        const PON = 1<<7;
    }
}

impl EventStatus {
    pub fn parse(response: &str) -> Result<EventStatus> {
        let value = response.trim();
        value.parse::<u8>()
            .map(EventStatus::from_bits_retain)
            .map_err(|_| Error::Parse {
                query: QUERY_EVENT_STATUS.to_owned(),
                response: value.to_owned(),
                kind: "event status register",
            })
    }

    pub fn has_errors(self) -> bool {
        self.intersects(EventStatus::QYE | EventStatus::DDE | EventStatus::EXE | EventStatus::CME)
    }
}

/// Split an error queue entry such as `-113,"Undefined header"` into its code and message.
pub fn parse_error_entry(response: &str) -> Result<(i32, String)> {
    let malformed = || Error::Parse {
        query: QUERY_SYSTEM_ERROR.to_owned(),
        response: response.to_owned(),
        kind: "error queue entry",
    };
    let (code, message) = response.trim().split_once(',').ok_or_else(malformed)?;
    let code = code.trim().parse::<i32>().map_err(|_| malformed())?;
    Ok((code, message.trim().trim_matches('"').to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_entry() {
        assert_eq!(parse_error_entry("0,\"No error\"\n").unwrap(), (0, "No error".to_owned()));
        assert_eq!(parse_error_entry("-222,\"Data out of range; value clipped\"").unwrap(),
                   (-222, "Data out of range; value clipped".to_owned()));
    }

    #[test]
    fn error_entry_malformed() {
        assert!(matches!(parse_error_entry("No error"), Err(Error::Parse { .. })));
        assert!(matches!(parse_error_entry("x,\"No error\""), Err(Error::Parse { .. })));
    }

    #[test]
    fn event_status() {
        let status = EventStatus::parse("48\n").unwrap();
        assert_eq!(status, EventStatus::EXE | EventStatus::CME);
        assert!(status.has_errors());
        assert!(!EventStatus::parse("129").unwrap().has_errors());
        assert!(matches!(EventStatus::parse("-1"), Err(Error::Parse { .. })));
    }
}
