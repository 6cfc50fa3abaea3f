use std::fmt::Display;

use crate::{BurstMode, Capabilities, EditMemory, Error, Function, PulseHold, Result, Span};
use crate::device::Device;
use crate::sys::Transport;

/// One output channel of a [`Device`].
///
/// A channel holds no state of its own: every getter queries the instrument and every setter
/// writes to it.
#[derive(Debug)]
pub struct Channel<'a, T: Transport> {
    device: &'a mut Device<T>,
    number: u8,
}

impl<'a, T: Transport> Channel<'a, T> {
    pub(crate) fn new(device: &'a mut Device<T>, number: u8) -> Channel<'a, T> {
        Channel { device, number }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    fn output(&self, suffix: &str) -> String {
        format!("OUTP{}{}", self.number, suffix)
    }

    fn source(&self, suffix: &str) -> String {
        format!("SOUR{}:{}", self.number, suffix)
    }

    fn get_float(&mut self, header: String) -> Result<f64> {
        self.device.query_float(&(header + "?"))
    }

    fn get_bool(&mut self, header: String) -> Result<bool> {
        self.device.query_bool(&(header + "?"))
    }

    fn get_token(&mut self, header: String) -> Result<String> {
        self.device.query_string(&(header + "?"))
    }

    fn set<V: Display>(&mut self, header: String, value: V) -> Result<()> {
        self.device.write(&format!("{} {}", header, value))
    }

    fn set_bool(&mut self, header: String, value: bool) -> Result<()> {
        self.set(header, if value { "ON" } else { "OFF" })
    }

    fn require_burst(&self) -> Result<()> {
        if self.number == 2 {
            self.device.require(Capabilities::CHANNEL2_BURST)?;
        }
        Ok(())
    }

    pub fn output_enabled(&mut self) -> Result<bool> {
        self.get_bool(self.output(""))
    }

    pub fn set_output_enabled(&mut self, enabled: bool) -> Result<()> {
        self.set_bool(self.output(""), enabled)
    }

    /// Load impedance the output amplitude is calibrated for, in ohms. High impedance reads
    /// back as a very large value.
    pub fn output_impedance(&mut self) -> Result<f64> {
        self.get_float(self.output(":IMP"))
    }

    pub fn set_output_impedance(&mut self, ohms: f64) -> Result<()> {
        self.set(self.output(":IMP"), ohms)
    }

    /// High level of the output signal, in volts. Setting it keeps the low level and changes
    /// amplitude and offset.
    pub fn voltage_max(&mut self) -> Result<f64> {
        self.get_float(self.source("VOLT:LEV:IMM:HIGH"))
    }

    pub fn set_voltage_max(&mut self, volts: f64) -> Result<()> {
        self.set(self.source("VOLT:LEV:IMM:HIGH"), volts)
    }

    /// Low level of the output signal, in volts.
    pub fn voltage_min(&mut self) -> Result<f64> {
        self.get_float(self.source("VOLT:LEV:IMM:LOW"))
    }

    pub fn set_voltage_min(&mut self, volts: f64) -> Result<()> {
        self.set(self.source("VOLT:LEV:IMM:LOW"), volts)
    }

    pub fn voltage_offset(&mut self) -> Result<f64> {
        self.get_float(self.source("VOLT:LEV:IMM:OFFS"))
    }

    pub fn set_voltage_offset(&mut self, volts: f64) -> Result<()> {
        self.set(self.source("VOLT:LEV:IMM:OFFS"), volts)
    }

    /// Peak-to-peak amplitude, in volts.
    pub fn voltage_amplitude(&mut self) -> Result<f64> {
        self.get_float(self.source("VOLT:LEV:IMM:AMPL"))
    }

    pub fn set_voltage_amplitude(&mut self, volts: f64) -> Result<()> {
        self.set(self.source("VOLT:LEV:IMM:AMPL"), volts)
    }

    pub fn function(&mut self) -> Result<Function> {
        let token = self.get_token(self.source("FUNC:SHAP"))?;
        Function::from_token(&token)
    }

    pub fn set_function(&mut self, function: Function) -> Result<()> {
        self.set(self.source("FUNC:SHAP"), function.token())
    }

    /// Frequency, in hertz.
    pub fn frequency(&mut self) -> Result<f64> {
        self.get_float(self.source("FREQ:FIX"))
    }

    pub fn set_frequency(&mut self, hertz: f64) -> Result<()> {
        self.set(self.source("FREQ:FIX"), hertz)
    }

    /// Phase, in radians.
    pub fn phase(&mut self) -> Result<f64> {
        self.get_float(self.source("PHAS:ADJ"))
    }

    pub fn set_phase(&mut self, radians: f64) -> Result<()> {
        self.set(self.source("PHAS:ADJ"), radians)
    }

    pub fn burst_enabled(&mut self) -> Result<bool> {
        self.require_burst()?;
        self.get_bool(self.source("BURS:STAT"))
    }

    pub fn set_burst_enabled(&mut self, enabled: bool) -> Result<()> {
        self.require_burst()?;
        self.set_bool(self.source("BURS:STAT"), enabled)
    }

    pub fn burst_mode(&mut self) -> Result<BurstMode> {
        self.require_burst()?;
        let token = self.get_token(self.source("BURS:MODE"))?;
        BurstMode::from_token(&token)
    }

    pub fn set_burst_mode(&mut self, mode: BurstMode) -> Result<()> {
        self.require_burst()?;
        self.set(self.source("BURS:MODE"), mode.token())
    }

    /// Number of waveform cycles output per triggered burst.
    pub fn burst_cycles(&mut self) -> Result<i64> {
        self.require_burst()?;
        self.device.query_int(&self.source("BURS:NCYC?"))
    }

    pub fn set_burst_cycles(&mut self, cycles: i64) -> Result<()> {
        self.require_burst()?;
        self.set(self.source("BURS:NCYC"), cycles)
    }

    /// Delay between the trigger and the start of the burst, in seconds.
    pub fn burst_delay(&mut self) -> Result<f64> {
        self.require_burst()?;
        self.device.require(Capabilities::BURST_DELAY)?;
        self.get_float(self.source("BURS:TDEL"))
    }

    pub fn set_burst_delay(&mut self, seconds: f64) -> Result<()> {
        self.require_burst()?;
        self.device.require(Capabilities::BURST_DELAY)?;
        self.set(self.source("BURS:TDEL"), seconds)
    }

    /// Pulse width, in seconds.
    pub fn pulse_width(&mut self) -> Result<f64> {
        self.get_float(self.source("PULS:WIDT"))
    }

    pub fn set_pulse_width(&mut self, seconds: f64) -> Result<()> {
        self.set(self.source("PULS:WIDT"), seconds)
    }

    /// Pulse duty cycle, in percent.
    pub fn pulse_duty(&mut self) -> Result<f64> {
        self.get_float(self.source("PULS:DCYC"))
    }

    pub fn set_pulse_duty(&mut self, percent: f64) -> Result<()> {
        self.set(self.source("PULS:DCYC"), percent)
    }

    /// Pulse lead delay, in seconds.
    pub fn pulse_delay(&mut self) -> Result<f64> {
        self.device.require(Capabilities::PULSE_DELAY)?;
        self.get_float(self.source("PULS:DEL"))
    }

    pub fn set_pulse_delay(&mut self, seconds: f64) -> Result<()> {
        self.device.require(Capabilities::PULSE_DELAY)?;
        self.set(self.source("PULS:DEL"), seconds)
    }

    pub fn pulse_hold(&mut self) -> Result<PulseHold> {
        self.device.require(Capabilities::PULSE_HOLD)?;
        let token = self.get_token(self.source("PULS:HOLD"))?;
        PulseHold::from_token(&token)
    }

    pub fn set_pulse_hold(&mut self, hold: PulseHold) -> Result<()> {
        self.device.require(Capabilities::PULSE_HOLD)?;
        self.set(self.source("PULS:HOLD"), hold.token())
    }

    /// Pulse period, in seconds.
    pub fn pulse_period(&mut self) -> Result<f64> {
        self.get_float(self.source("PULS:PER"))
    }

    pub fn set_pulse_period(&mut self, seconds: f64) -> Result<()> {
        self.set(self.source("PULS:PER"), seconds)
    }

    /// Leading edge transition time, in seconds.
    pub fn pulse_lead_transition(&mut self) -> Result<f64> {
        self.device.require(Capabilities::PULSE_TRANSITION)?;
        self.get_float(self.source("PULS:TRAN:LEAD"))
    }

    pub fn set_pulse_lead_transition(&mut self, seconds: f64) -> Result<()> {
        self.device.require(Capabilities::PULSE_TRANSITION)?;
        self.set(self.source("PULS:TRAN:LEAD"), seconds)
    }

    /// Trailing edge transition time, in seconds.
    pub fn pulse_trail_transition(&mut self) -> Result<f64> {
        self.device.require(Capabilities::PULSE_TRANSITION)?;
        self.get_float(self.source("PULS:TRAN:TRA"))
    }

    pub fn set_pulse_trail_transition(&mut self, seconds: f64) -> Result<()> {
        self.device.require(Capabilities::PULSE_TRANSITION)?;
        self.set(self.source("PULS:TRAN:TRA"), seconds)
    }

    /// Edit memory that [`Channel::set_arbitrary_signal`] uploads to.
    pub fn edit_memory(&self) -> Result<EditMemory> {
        EditMemory::for_channel(self.number)
    }

    /// Output an arbitrary signal, given in volts.
    ///
    /// Amplitude and offset are set so that the output range spans exactly the range of the
    /// signal, the signal is scaled to sample codes and uploaded to the edit memory of this
    /// channel, and that memory is selected as the waveform function.
    pub fn set_arbitrary_signal(&mut self, signal: &[f64]) -> Result<()> {
        let span = Span::of(signal)?;
        if !self.device.is_connected() {
            return Err(Error::NotConnected)
        }
        self.set_voltage_amplitude(span.amplitude())?;
        self.set_voltage_offset(span.offset())?;
        let codes = span.to_codes(signal, self.device.variant().max_sample_code());
        let memory = self.edit_memory()?;
        self.device.write_arbitrary_memory(&codes, memory)?;
        let function = self.device.edit_memory_function(memory);
        self.set_function(function)
    }
}
