//! Transport over a VISA library (NI-VISA, Keysight IO Libraries, ...).

use std::ffi::CString;
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use visa_rs::prelude::*;
use visa_rs::{Instrument, VisaString};

use crate::{Error, Result};
use crate::block::read_block;
use super::{ResourceManager, Transport};

impl From<visa_rs::Error> for Error {
    fn from(error: visa_rs::Error) -> Self {
        Error::Other(Box::new(error))
    }
}

fn resource_name(resource: &str) -> Result<VisaString> {
    CString::new(resource)
        .map(VisaString::from)
        .map_err(|_| Error::InvalidArgument(format!("resource name {:?} contains a NUL byte", resource)))
}

pub struct VisaResourceManager {
    rm: DefaultRM,
}

impl VisaResourceManager {
    /// Open the default resource manager of the installed VISA library.
    pub fn new() -> Result<VisaResourceManager> {
        Ok(VisaResourceManager { rm: DefaultRM::new()? })
    }
}

impl ResourceManager for VisaResourceManager {
    type Transport = VisaTransport;

    fn list_resources(&self) -> Result<Vec<String>> {
        let mut list = match self.rm.find_res_list(&resource_name("?*INSTR")?) {
            Ok(list) => list,
            Err(error) => {
                // VISA reports an empty bus as an error
                log::debug!("list_resources: {}", error);
                return Ok(Vec::new())
            }
        };
        let mut resources = Vec::new();
        while let Some(resource) = list.find_next()? {
            resources.push(resource.to_string());
        }
        Ok(resources)
    }

    fn open(&self, resource: &str, timeout: Duration) -> Result<VisaTransport> {
        let instrument = self.rm.open(&resource_name(resource)?, AccessMode::NO_LOCK, timeout)
            .map_err(|error| Error::NotFound(format!("{}: {}", resource, error)))?;
        log::debug!("open({:?})", resource);
        Ok(VisaTransport { instrument })
    }
}

pub struct VisaTransport {
    instrument: Instrument,
}

impl std::fmt::Debug for VisaTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisaTransport").finish_non_exhaustive()
    }
}

impl Transport for VisaTransport {
    fn write(&mut self, command: &str) -> Result<()> {
        self.instrument.write_all(format!("{}\n", command).as_bytes())?;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.write(command)?;
        let mut response = String::new();
        BufReader::new(&self.instrument).read_line(&mut response)?;
        Ok(response)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut message = Vec::with_capacity(data.len() + 1);
        message.extend_from_slice(data);
        message.push(b'\n');
        self.instrument.write_all(&message)?;
        Ok(())
    }

    /// Reads the block and the terminator after it through one reader, so that nothing of the
    /// response is left for the next query.
    fn query_bytes(&mut self, command: &str) -> Result<Vec<u8>> {
        self.write(command)?;
        read_block(BufReader::new(&self.instrument))
    }
}
