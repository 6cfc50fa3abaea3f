//! Simulated instrument.
//!
//! `LoopbackInstrument` behaves like a function generator that accepts the commands issued by
//! this crate: settings written to it are echoed back on query, unset settings read back as
//! the power-on defaults, `*RST` restores those defaults, and anything it does not recognize
//! lands in the error queue. Every message is recorded so that tests can check exactly what was
//! sent.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

use crate::{Capabilities, Error, EventStatus, Result, Variant};
use crate::block::{decode_block, encode_block};
use crate::regs::ieee488;
use super::{ResourceManager, Transport};

const UNDEFINED_HEADER: (i32, &str) = (-113, "Undefined header");
const DATA_TYPE_ERROR: (i32, &str) = (-104, "Data type error");

/// Power-on value of a setting, with the channel number replaced by `n`.
fn default_setting(generic_header: &str) -> Option<&'static str> {
    Some(match generic_header {
        "OUTPn"                 => "0",
        "OUTPn:IMP"             => "50",
        "SOURn:VOLT:LEV:IMM:OFFS" => "0",
        "SOURn:VOLT:LEV:IMM:AMPL" => "1",
        "SOURn:FUNC:SHAP"       => "SIN",
        "SOURn:FREQ:FIX"        => "1.0E+6",
        "SOURn:PHAS:ADJ"        => "0",
        "SOURn:BURS:STAT"       => "0",
        "SOURn:BURS:MODE"       => "TRIG",
        "SOURn:BURS:NCYC"       => "5",
        "SOURn:BURS:TDEL"       => "0",
        "SOURn:PULS:WIDT"       => "5.0E-7",
        "SOURn:PULS:DCYC"       => "50",
        "SOURn:PULS:DEL"        => "0",
        "SOURn:PULS:HOLD"       => "WIDT",
        "SOURn:PULS:PER"        => "1.0E-6",
        "SOURn:PULS:TRAN:LEAD"  => "1.8E-9",
        "SOURn:PULS:TRAN:TRA"   => "1.8E-9",
        "TRIG:SOUR"             => "TIM",
        "TRIG:TIM"              => "1.0E-3",
        _ => return None,
    })
}

const LEVEL_HIGH: &str = "SOURn:VOLT:LEV:IMM:HIGH";
const LEVEL_LOW: &str = "SOURn:VOLT:LEV:IMM:LOW";

fn is_level(generic_header: &str) -> bool {
    generic_header == LEVEL_HIGH || generic_header == LEVEL_LOW
}

fn generic_header(header: &str) -> String {
    let mut generic = header.to_owned();
    if (header.starts_with("OUTP") || header.starts_with("SOUR"))
            && matches!(header.as_bytes().get(4), Some(b'1' | b'2')) {
        generic.replace_range(4..5, "n");
    }
    generic
}

fn normalize(value: &str) -> String {
    match value {
        "ON" => "1".to_owned(),
        "OFF" => "0".to_owned(),
        _ => value.to_owned(),
    }
}

#[derive(Debug, Clone)]
pub struct LoopbackInstrument {
    identity: String,
    variant: Option<Variant>,
    settings: HashMap<String, String>,
    // errors not yet visible through `SYST:ERR?` on instruments that gate the queue behind `*ESR?`
    pending_errors: VecDeque<(i32, String)>,
    errors: VecDeque<(i32, String)>,
    event_status: EventStatus,
    edit_memories: HashMap<String, Vec<i16>>,
    log: Vec<String>,
    closed: bool,
    open_timeout: Option<Duration>,
}

impl LoopbackInstrument {
    pub fn new(model: &str) -> LoopbackInstrument {
        LoopbackInstrument {
            identity: format!("TEKTRONIX,{},C000000,SCPI:99.0 FV:1.0.0", model),
            variant: Variant::from_model(model).ok(),
            settings: HashMap::new(),
            pending_errors: VecDeque::new(),
            errors: VecDeque::new(),
            event_status: EventStatus::PON,
            edit_memories: HashMap::new(),
            log: Vec::new(),
            closed: false,
            open_timeout: None,
        }
    }

    pub fn afg1022() -> LoopbackInstrument {
        Self::new("AFG1022")
    }

    pub fn afg31052() -> LoopbackInstrument {
        Self::new("AFG31052")
    }

    /// Every message received, in order. Binary messages are recorded by header only.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear()
    }

    /// Number of messages received that are exactly `message`.
    pub fn count(&self, message: &str) -> usize {
        self.log.iter().filter(|logged| *logged == message).count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Timeout this instrument was opened with through [`LoopbackResourceManager`].
    pub fn open_timeout(&self) -> Option<Duration> {
        self.open_timeout
    }

    /// Queue an error as if the instrument had rejected a command.
    pub fn push_error(&mut self, code: i32, message: &str) {
        self.event_status |= match code {
            -199..=-100 => EventStatus::CME,
            -299..=-200 => EventStatus::EXE,
            -499..=-400 => EventStatus::QYE,
            _ => EventStatus::DDE,
        };
        let entry = (code, message.to_owned());
        if self.gated() {
            self.pending_errors.push_back(entry)
        } else {
            self.errors.push_back(entry)
        }
    }

    /// Current value of a setting, e.g. `SOUR1:FREQ:FIX`. The high and low levels are derived
    /// from amplitude and offset.
    pub fn setting(&self, header: &str) -> Option<String> {
        let generic = generic_header(header);
        if is_level(&generic) {
            let (high, low) = self.levels(&header[..5])?;
            let level = if generic == LEVEL_HIGH { high } else { low };
            return Some(level.to_string())
        }
        self.settings.get(header)
            .map(String::as_str)
            .or_else(|| default_setting(&generic_header(header)))
            .map(str::to_owned)
    }

    /// Overwrite a setting from the instrument side, bypassing validation.
    pub fn set_setting(&mut self, header: &str, value: &str) {
        self.settings.insert(header.to_owned(), value.to_owned());
    }

    /// Contents of an edit memory, e.g. `EMEM1`.
    pub fn edit_memory(&self, name: &str) -> Option<&[i16]> {
        self.edit_memories.get(name).map(Vec::as_slice)
    }

    /// High and low level of `source` (e.g. `SOUR1`).
    fn levels(&self, source: &str) -> Option<(f64, f64)> {
        let amplitude: f64 = self.setting(&format!("{}:VOLT:LEV:IMM:AMPL", source))?.parse().ok()?;
        let offset: f64 = self.setting(&format!("{}:VOLT:LEV:IMM:OFFS", source))?.parse().ok()?;
        Some((offset + amplitude / 2.0, offset - amplitude / 2.0))
    }

    fn set_level(&mut self, header: &str, value: &str) {
        let source = &header[..5];
        let (high, low) = match (value.parse::<f64>(), self.levels(source)) {
            (Ok(value), Some((_, low))) if header.ends_with(":HIGH") => (value, low),
            (Ok(value), Some((high, _))) => (high, value),
            _ => return self.push_error(DATA_TYPE_ERROR.0, DATA_TYPE_ERROR.1),
        };
        self.settings.insert(format!("{}:VOLT:LEV:IMM:AMPL", source), (high - low).to_string());
        self.settings.insert(format!("{}:VOLT:LEV:IMM:OFFS", source), ((high + low) / 2.0).to_string());
    }

    fn gated(&self) -> bool {
        self.variant.map_or(false, |variant| variant.supports(Capabilities::EVENT_STATUS_GATE))
    }

    fn memory_names(&self) -> &'static [&'static str] {
        match self.variant {
            Some(variant) if !variant.supports(Capabilities::EDIT_MEMORY_SLOTS) => &["EMEM"],
            _ => &["EMEM1", "EMEM2"],
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(io::Error::new(io::ErrorKind::NotConnected, "loopback instrument closed").into())
        } else {
            Ok(())
        }
    }

    fn execute(&mut self, command: &str) {
        match command.trim() {
            ieee488::CMD_RESET => self.settings.clear(),
            ieee488::CMD_CLEAR_STATUS => {
                self.errors.clear();
                self.pending_errors.clear();
                self.event_status = EventStatus::empty();
            }
            ieee488::CMD_TRIGGER | ieee488::CMD_WAIT => (),
            command => match command.split_once(' ') {
                Some((header, value)) if is_level(&generic_header(header)) => {
                    self.set_level(header, value.trim());
                }
                Some((header, value)) if default_setting(&generic_header(header)).is_some() => {
                    self.settings.insert(header.to_owned(), normalize(value.trim()));
                }
                _ => self.push_error(UNDEFINED_HEADER.0, UNDEFINED_HEADER.1),
            }
        }
    }

    fn respond(&mut self, query: &str) -> String {
        match query.trim() {
            ieee488::QUERY_IDENTIFY => self.identity.clone(),
            ieee488::QUERY_EVENT_STATUS => {
                let status = std::mem::replace(&mut self.event_status, EventStatus::empty());
                self.errors.extend(self.pending_errors.drain(..));
                status.bits().to_string()
            }
            ieee488::QUERY_SYSTEM_ERROR => match self.errors.pop_front() {
                Some((code, message)) => format!("{},\"{}\"", code, message),
                None => "0,\"No error\"".to_owned(),
            }
            "*OPC?" => "1".to_owned(),
            query => match query.strip_suffix('?').and_then(|header| self.setting(header)) {
                Some(value) => value,
                None => {
                    self.push_error(UNDEFINED_HEADER.0, UNDEFINED_HEADER.1);
                    String::new()
                }
            }
        }
    }

    fn memory_name<'a>(&self, argument: &'a str) -> Option<&'a str> {
        let name = argument.trim();
        self.memory_names().iter().any(|&known| known == name).then_some(name)
    }
}

impl Transport for LoopbackInstrument {
    fn write(&mut self, command: &str) -> Result<()> {
        self.ensure_open()?;
        self.log.push(command.to_owned());
        self.execute(command);
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.ensure_open()?;
        self.log.push(command.to_owned());
        let mut response = self.respond(command);
        response.push('\n');
        Ok(response)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let split = data.iter().position(|&byte| byte == b',').unwrap_or(data.len());
        let header = String::from_utf8_lossy(&data[..split]).into_owned();
        let block = data.get(split + 1..).unwrap_or_default();
        self.log.push(format!("{},<{} byte block>", header, block.len()));
        let memory = header.strip_prefix("DATA:DATA ").and_then(|argument| self.memory_name(argument));
        match (memory, decode_block(block)) {
            (Some(memory), Ok(samples)) => {
                self.edit_memories.insert(memory.to_owned(), samples);
            }
            (None, _) => self.push_error(UNDEFINED_HEADER.0, UNDEFINED_HEADER.1),
            (_, Err(_)) => self.push_error(DATA_TYPE_ERROR.0, DATA_TYPE_ERROR.1),
        }
        Ok(())
    }

    fn query_bytes(&mut self, command: &str) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.log.push(command.to_owned());
        let memory = command.strip_prefix("DATA:DATA? ").and_then(|argument| self.memory_name(argument));
        let samples = match memory {
            Some(memory) => self.edit_memories.get(memory).cloned().unwrap_or_default(),
            None => {
                self.push_error(UNDEFINED_HEADER.0, UNDEFINED_HEADER.1);
                Vec::new()
            }
        };
        let mut block = encode_block(&samples)?;
        block.push(b'\n');
        Ok(block)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Resource manager that hands out [`LoopbackInstrument`]s.
#[derive(Debug, Clone, Default)]
pub struct LoopbackResourceManager {
    instruments: Vec<(String, String)>,
}

impl LoopbackResourceManager {
    pub fn new() -> LoopbackResourceManager {
        Self::default()
    }

    /// Make a simulated instrument with the given model number available at `resource`.
    pub fn with_instrument(mut self, resource: &str, model: &str) -> LoopbackResourceManager {
        self.instruments.push((resource.to_owned(), model.to_owned()));
        self
    }
}

impl ResourceManager for LoopbackResourceManager {
    type Transport = LoopbackInstrument;

    fn list_resources(&self) -> Result<Vec<String>> {
        Ok(self.instruments.iter().map(|(resource, _)| resource.clone()).collect())
    }

    fn open(&self, resource: &str, timeout: Duration) -> Result<LoopbackInstrument> {
        self.instruments.iter()
            .find(|(address, _)| address == resource)
            .map(|(_, model)| LoopbackInstrument { open_timeout: Some(timeout), ..LoopbackInstrument::new(model) })
            .ok_or_else(|| Error::NotFound(format!("no instrument at {}", resource)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_and_defaults() {
        let mut instrument = LoopbackInstrument::afg31052();
        assert_eq!(instrument.query("SOUR1:FREQ:FIX?").unwrap(), "1.0E+6\n");
        instrument.write("SOUR1:FREQ:FIX 3000").unwrap();
        instrument.write("OUTP2 ON").unwrap();
        assert_eq!(instrument.query("SOUR1:FREQ:FIX?").unwrap(), "3000\n");
        assert_eq!(instrument.query("SOUR2:FREQ:FIX?").unwrap(), "1.0E+6\n");
        assert_eq!(instrument.query("OUTP2?").unwrap(), "1\n");
        instrument.write("*RST").unwrap();
        assert_eq!(instrument.query("SOUR1:FREQ:FIX?").unwrap(), "1.0E+6\n");
        assert_eq!(instrument.count("SOUR1:FREQ:FIX?"), 3);
    }

    #[test]
    fn levels() {
        let mut instrument = LoopbackInstrument::afg1022();
        assert_eq!(instrument.query("SOUR1:VOLT:LEV:IMM:HIGH?").unwrap(), "0.5\n");
        assert_eq!(instrument.query("SOUR1:VOLT:LEV:IMM:LOW?").unwrap(), "-0.5\n");
        instrument.write("SOUR1:VOLT:LEV:IMM:LOW -1.5").unwrap();
        assert_eq!(instrument.setting("SOUR1:VOLT:LEV:IMM:AMPL").unwrap(), "2");
        assert_eq!(instrument.setting("SOUR1:VOLT:LEV:IMM:OFFS").unwrap(), "-0.5");
        instrument.write("SOUR1:VOLT:LEV:IMM:AMPL 4").unwrap();
        assert_eq!(instrument.query("SOUR1:VOLT:LEV:IMM:HIGH?").unwrap(), "1.5\n");
        assert_eq!(instrument.query("SOUR2:VOLT:LEV:IMM:HIGH?").unwrap(), "0.5\n");
        instrument.write("SOUR1:VOLT:LEV:IMM:HIGH high").unwrap();
        assert_eq!(instrument.query("SYST:ERR?").unwrap(), "-104,\"Data type error\"\n");
        instrument.write("SOUR1:VOLT:LIM:HIGH 3").unwrap();
        assert_eq!(instrument.query("SYST:ERR?").unwrap(), "-113,\"Undefined header\"\n");
    }

    #[test]
    fn error_queue() {
        let mut instrument = LoopbackInstrument::afg1022();
        instrument.write("SOUR1:BOGUS 1").unwrap();
        assert_eq!(instrument.query("SYST:ERR?").unwrap(), "-113,\"Undefined header\"\n");
        assert_eq!(instrument.query("SYST:ERR?").unwrap(), "0,\"No error\"\n");
    }

    #[test]
    fn error_queue_gated() {
        let mut instrument = LoopbackInstrument::afg31052();
        instrument.push_error(-222, "Data out of range");
        assert_eq!(instrument.query("SYST:ERR?").unwrap(), "0,\"No error\"\n");
        assert_eq!(instrument.query("*ESR?").unwrap(), "144\n"); // PON | EXE
        assert_eq!(instrument.query("SYST:ERR?").unwrap(), "-222,\"Data out of range\"\n");
    }

    #[test]
    fn edit_memory() {
        let mut instrument = LoopbackInstrument::afg31052();
        let mut message = b"DATA:DATA EMEM2,".to_vec();
        message.extend(encode_block(&[1, 2, 3]).unwrap());
        instrument.write_bytes(&message).unwrap();
        assert_eq!(instrument.edit_memory("EMEM2"), Some(&[1, 2, 3][..]));
        assert_eq!(instrument.query_bytes("DATA:DATA? EMEM2").unwrap(), b"#16\x00\x01\x00\x02\x00\x03\n".to_vec());
        assert_eq!(instrument.log().last().unwrap(), "DATA:DATA? EMEM2");
    }

    #[test]
    fn closed() {
        let mut instrument = LoopbackInstrument::afg1022();
        instrument.close().unwrap();
        assert!(instrument.is_closed());
        assert!(matches!(instrument.write("*CLS"), Err(Error::Io(_))));
    }
}
