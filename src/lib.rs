//! Driver library for Tektronix AFG1000 and AFG31000 series arbitrary function generators.
//!
//! The instrument is controlled over SCPI. Every property read or write on a [`Channel`] is
//! a full round trip through a [`sys::Transport`], followed by a poll of the instrument error
//! queue, so that a rejected command surfaces as [`Error::Instrument`] at the call site.

pub mod sys;
mod regs;
mod config;
mod variant;
mod params;
mod block;
mod waveform;
mod discovery;
mod device;
mod channel;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("device not found: {0}")]
    NotFound(String),
    #[error("device not connected")]
    NotConnected,
    #[error("instrument error {code}: {message}")]
    Instrument {
        code: i32,
        message: String,
    },
    #[error("cannot parse response {response:?} to {query:?} as {kind}")]
    Parse {
        query: String,
        response: String,
        kind: &'static str,
    },
    #[error("{option:?} is not a valid {table}")]
    InvalidOption {
        table: &'static str,
        option: String,
    },
    #[error("instrument returned unknown {table} {response:?}")]
    UnknownResponse {
        table: &'static str,
        response: String,
    },
    #[error("{feature:?} is not supported by {variant}")]
    UnsupportedFeature {
        feature: Capabilities,
        variant: Variant,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Sync + Send + 'static>),
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use regs::ieee488::EventStatus;

pub use config::{
    DeviceConfiguration,
    TEKTRONIX_VENDOR_ID,
};

pub use variant::{
    Variant,
    Capabilities,
};

pub use params::{
    Function,
    TriggerSource,
    BurstMode,
    PulseHold,
    EditMemory,
};

pub use block::{
    encode_block,
    decode_block,
    read_block,
    MAX_SAMPLES,
};

pub use waveform::Span;

pub use discovery::{
    manufacturer_id,
    list_resources,
    candidates,
    select_resource,
};

pub use device::{
    Device,
    Identity,
};

pub use channel::Channel;

#[cfg(feature = "visa")]
pub type VisaDevice =
    device::Device<sys::visa::VisaTransport>;

