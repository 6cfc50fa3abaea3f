use std::fmt;

use bitflags::bitflags;

use crate::{Error, Result};

bitflags! {
    /// Features that only some instrument families implement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const TRIGGER_SOURCE    = 1<<0;
        const TRIGGER_TIMER     = 1<<1;
        const BURST_DELAY       = 1<<2;
        /// Burst mode is available on channel 2, not only on channel 1.
        const CHANNEL2_BURST    = 1<<3;
        const PULSE_DELAY       = 1<<4;
        const PULSE_HOLD        = 1<<5;
        const PULSE_TRANSITION  = 1<<6;
        /// Edit memories are addressed by number (`EMEM1`, `EMEM2`) rather than there being
        /// a single `EMEM`.
        const EDIT_MEMORY_SLOTS = 1<<7;
        /// `SYST:ERR?` reports nothing until `*ESR?` has been read.
        const EVENT_STATUS_GATE = 1<<8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// AFG1000 series, e.g. AFG1022.
    Afg1000,
    /// AFG31000 series, e.g. AFG31052.
    Afg31000,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Afg1000, Variant::Afg31000];

    fn model_prefix(self) -> &'static str {
        match self {
            Self::Afg1000  => "AFG1",
            Self::Afg31000 => "AFG31",
        }
    }

    /// Determine the instrument family from the model field of `*IDN?`.
    pub fn from_model(model: &str) -> Result<Variant> {
        let model = model.trim();
        Self::ALL.iter()
            .copied()
            .find(|variant| model.starts_with(variant.model_prefix()))
            .ok_or_else(|| Error::NotFound(format!("unsupported instrument model {:?}", model)))
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::Afg1000  => Capabilities::empty(),
            Self::Afg31000 => Capabilities::all(),
        }
    }

    pub fn supports(self, feature: Capabilities) -> bool {
        self.capabilities().contains(feature)
    }

    /// Fail with [`Error::UnsupportedFeature`] unless every flag in `feature` is supported.
    pub fn require(self, feature: Capabilities) -> Result<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(Error::UnsupportedFeature { feature: feature.difference(self.capabilities()), variant: self })
        }
    }

    /// Largest sample code accepted by the edit memories; code 0 corresponds to the low end of
    /// the output voltage range and this code to the high end.
    pub fn max_sample_code(self) -> i16 {
        match self {
            Self::Afg1000  => 8191,
            Self::Afg31000 => 16383,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Afg1000  => write!(f, "AFG1000 series"),
            Self::Afg31000 => write!(f, "AFG31000 series"),
        }
    }
}
