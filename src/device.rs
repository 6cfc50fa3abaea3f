use std::str::FromStr;
use std::thread::sleep;

use crate::{Capabilities, DeviceConfiguration, EditMemory, Error, Function, Result, TriggerSource, Variant};
use crate::block::{decode_block, encode_block};
use crate::channel::Channel;
use crate::discovery;
use crate::regs::ieee488::{self, EventStatus};
use crate::sys::{ResourceManager, Transport};

/// Fields of the `*IDN?` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl Identity {
    pub fn parse(response: &str) -> Result<Identity> {
        let mut fields = response.trim().splitn(4, ',').map(str::trim);
        let manufacturer = fields.next().unwrap_or_default();
        let model = fields.next().unwrap_or_default();
        if manufacturer.is_empty() || model.is_empty() {
            return Err(Error::Parse {
                query: ieee488::QUERY_IDENTIFY.to_owned(),
                response: response.to_owned(),
                kind: "identification",
            })
        }
        Ok(Identity {
            manufacturer: manufacturer.to_owned(),
            model: model.to_owned(),
            serial: fields.next().unwrap_or_default().to_owned(),
            firmware: fields.next().unwrap_or_default().to_owned(),
        })
    }
}

fn strip_terminator(response: &str) -> &str {
    response.trim_end_matches(|c| c == '\r' || c == '\n')
}

fn parse_response<V: FromStr>(query: &str, response: &str, kind: &'static str) -> Result<V> {
    response.trim().parse::<V>().map_err(|_| Error::Parse {
        query: query.to_owned(),
        response: response.to_owned(),
        kind,
    })
}

/// A connected function generator.
///
/// Every command written is followed by a pause (see [`DeviceConfiguration::write_delay`]) and
/// every command or query by a poll of the instrument error queue; a non-empty queue fails the
/// operation with [`Error::Instrument`]. After [`Device::close`], every operation fails with
/// [`Error::NotConnected`].
#[derive(Debug)]
pub struct Device<T: Transport> {
    transport: Option<T>,
    identity: Identity,
    variant: Variant,
    config: DeviceConfiguration,
}

impl<T: Transport> Device<T> {
    /// Connect to the instrument at `resource`, or, if `None`, to the first resource whose
    /// address carries the vendor id from `config`.
    pub fn connect<R>(rm: &R, resource: Option<&str>, config: DeviceConfiguration) -> Result<Device<T>>
            where R: ResourceManager<Transport = T> {
        let transport = match resource {
            Some(resource) => {
                rm.open(resource, config.timeout).map_err(|error| match error {
                    Error::NotFound(_) => error,
                    error => Error::NotFound(format!("{}: {}", resource, error)),
                })?
            }
            None => {
                let resources = discovery::list_resources(rm)?;
                let resource = discovery::select_resource(resources.iter().map(String::as_str),
                                                          config.manufacturer_id)
                    .ok_or_else(|| Error::NotFound(format!(
                        "no resource with vendor id {:#06x} among {:?}", config.manufacturer_id, resources)))?;
                log::info!("connect: selected {}", resource);
                rm.open(resource, config.timeout)?
            }
        };
        Self::open(transport, config)
    }

    /// Take ownership of an already opened transport and identify the instrument behind it.
    pub fn open(mut transport: T, config: DeviceConfiguration) -> Result<Device<T>> {
        let identified = transport.query(ieee488::QUERY_IDENTIFY)
            .and_then(|response| Identity::parse(&response))
            .and_then(|identity| Variant::from_model(&identity.model).map(|variant| (variant, identity)));
        let (variant, identity) = match identified {
            Ok(identified) => identified,
            Err(error) => {
                if let Err(close_error) = transport.close() {
                    log::warn!("open: failed to close transport: {}", close_error);
                }
                return Err(error)
            }
        };
        log::info!("open: {} {} ({}), serial {}, firmware {}",
                   identity.manufacturer, identity.model, variant, identity.serial, identity.firmware);
        Ok(Device { transport: Some(transport), identity, variant, config })
    }

    /// Release the transport. Closing a closed device does nothing.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            log::info!("close: {}", self.identity.model);
            transport.close()?;
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Direct access to the transport, bypassing pacing and error checking.
    pub fn transport(&self) -> Result<&T> {
        self.transport.as_ref().ok_or(Error::NotConnected)
    }

    /// Direct access to the transport, bypassing pacing and error checking.
    pub fn transport_mut(&mut self) -> Result<&mut T> {
        self.transport.as_mut().ok_or(Error::NotConnected)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn model(&self) -> &str {
        &self.identity.model
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn configuration(&self) -> &DeviceConfiguration {
        &self.config
    }

    pub(crate) fn require(&self, feature: Capabilities) -> Result<()> {
        self.transport()?;
        self.variant.require(feature)
    }

    /// One of the two output channels, numbered from 1.
    pub fn channel(&mut self, number: u8) -> Result<Channel<'_, T>> {
        match number {
            1 | 2 => Ok(Channel::new(self, number)),
            _ => Err(Error::InvalidArgument(format!("channel {} does not exist", number)))
        }
    }

    /// Restore the default settings and wait for the instrument to settle.
    pub fn reset(&mut self) -> Result<()> {
        self.write(ieee488::CMD_RESET)?;
        sleep(self.config.reset_delay);
        Ok(())
    }

    /// Clear the event registers and the error queue.
    pub fn clear(&mut self) -> Result<()> {
        self.write(ieee488::CMD_CLEAR_STATUS)
    }

    pub fn send_trigger(&mut self) -> Result<()> {
        self.write(ieee488::CMD_TRIGGER)
    }

    /// Make the instrument finish all pending commands before executing further ones.
    pub fn wait(&mut self) -> Result<()> {
        self.write(ieee488::CMD_WAIT)
    }

    /// Raw `*IDN?` response, e.g. `TEKTRONIX,AFG31052,C012345,SCPI:99.0 FV:1.5.2`.
    pub fn identify(&mut self) -> Result<String> {
        self.query_string(ieee488::QUERY_IDENTIFY)
    }

    /// Poll the error queue and fail if the instrument reported an error.
    pub fn check_errors(&mut self) -> Result<()> {
        let gated = self.variant.supports(Capabilities::EVENT_STATUS_GATE);
        let transport = self.transport_mut()?;
        if gated {
            let status = EventStatus::parse(&transport.query(ieee488::QUERY_EVENT_STATUS)?)?;
            log::trace!("check_errors: event status {:?}", status);
        }
        let response = transport.query(ieee488::QUERY_SYSTEM_ERROR)?;
        let (code, message) = ieee488::parse_error_entry(&response)?;
        if code != 0 {
            log::warn!("check_errors: instrument error {}: {}", code, message);
            return Err(Error::Instrument { code, message })
        }
        Ok(())
    }

    /// Send a command, pause, and check for errors.
    pub fn write(&mut self, command: &str) -> Result<()> {
        log::debug!("write({:?})", command);
        self.transport_mut()?.write(command)?;
        sleep(self.config.write_delay);
        self.check_errors()
    }

    /// Send a query and check for errors. The response is returned as received.
    pub fn query(&mut self, command: &str) -> Result<String> {
        let response = self.transport_mut()?.query(command)?;
        log::trace!("query({:?}) = {:?}", command, response);
        self.check_errors()?;
        Ok(response)
    }

    pub fn query_string(&mut self, command: &str) -> Result<String> {
        Ok(strip_terminator(&self.query(command)?).to_owned())
    }

    pub fn query_float(&mut self, command: &str) -> Result<f64> {
        let response = self.query_string(command)?;
        parse_response(command, &response, "float")
    }

    /// Integer settings may be reported in scientific notation (`5.0E+0`), so the response is
    /// parsed as a float and truncated.
    pub fn query_int(&mut self, command: &str) -> Result<i64> {
        let response = self.query_string(command)?;
        let value: f64 = parse_response(command, &response, "integer")?;
        if !value.is_finite() {
            return Err(Error::Parse { query: command.to_owned(), response, kind: "integer" })
        }
        Ok(value.trunc() as i64)
    }

    /// Booleans are reported as `0` or `1`; any non-zero integer is true.
    pub fn query_bool(&mut self, command: &str) -> Result<bool> {
        let response = self.query_string(command)?;
        let value: i64 = parse_response(command, &response, "boolean")?;
        Ok(value != 0)
    }

    fn edit_memory_name(&self, memory: EditMemory) -> String {
        if self.variant.supports(Capabilities::EDIT_MEMORY_SLOTS) {
            format!("EMEM{}", memory.number())
        } else {
            // there is a single edit memory, and it cannot be addressed by number
            "EMEM".to_owned()
        }
    }

    /// Waveform function that plays back `memory` on this instrument.
    pub fn edit_memory_function(&self, memory: EditMemory) -> Function {
        memory.function(self.variant.supports(Capabilities::EDIT_MEMORY_SLOTS))
    }

    /// Upload sample codes to an edit memory. Codes range from 0, the low end of the output
    /// voltage range, to [`Variant::max_sample_code`], the high end. Instruments with a single
    /// edit memory ignore `memory`.
    pub fn write_arbitrary_memory(&mut self, samples: &[i16], memory: EditMemory) -> Result<()> {
        if samples.is_empty() {
            return Err(Error::InvalidArgument("no samples to write".to_owned()))
        }
        let max_code = self.variant.max_sample_code();
        if let Some(index) = samples.iter().position(|sample| !(0..=max_code).contains(sample)) {
            return Err(Error::InvalidArgument(format!(
                "sample {} is {}, outside of 0..={}", index, samples[index], max_code)))
        }
        let name = self.edit_memory_name(memory);
        log::debug!("write_arbitrary_memory({} samples, {})", samples.len(), name);
        let mut message = format!("DATA:DATA {},", name).into_bytes();
        message.extend_from_slice(&encode_block(samples)?);
        self.transport_mut()?.write_bytes(&message)?;
        sleep(self.config.write_delay);
        self.check_errors()
    }

    /// Download the sample codes stored in an edit memory.
    pub fn read_arbitrary_memory(&mut self, memory: EditMemory) -> Result<Vec<i16>> {
        let command = format!("DATA:DATA? {}", self.edit_memory_name(memory));
        let block = self.transport_mut()?.query_bytes(&command)?;
        self.check_errors()?;
        let samples = decode_block(&block)?;
        log::debug!("read_arbitrary_memory({:?}) = {} samples", command, samples.len());
        Ok(samples)
    }

    /// Source of the trigger that starts a burst.
    pub fn trigger_source(&mut self) -> Result<TriggerSource> {
        self.require(Capabilities::TRIGGER_SOURCE)?;
        TriggerSource::from_token(&self.query_string("TRIG:SOUR?")?)
    }

    pub fn set_trigger_source(&mut self, source: TriggerSource) -> Result<()> {
        self.require(Capabilities::TRIGGER_SOURCE)?;
        self.write(&format!("TRIG:SOUR {}", source.token()))
    }

    /// Period of the internal trigger timer, in seconds.
    pub fn trigger_timer(&mut self) -> Result<f64> {
        self.require(Capabilities::TRIGGER_TIMER)?;
        self.query_float("TRIG:TIM?")
    }

    pub fn set_trigger_timer(&mut self, seconds: f64) -> Result<()> {
        self.require(Capabilities::TRIGGER_TIMER)?;
        self.write(&format!("TRIG:TIM {}", seconds))
    }
}

impl<T: Transport> Drop for Device<T> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            log::warn!("drop: failed to close transport: {}", error);
        }
    }
}
