//! Tests against a real instrument. Connect a single AFG1000 or AFG31000 series generator over
//! USB and run with `TEKTRONIXSG_HARDWARE=1 cargo test --features visa --test hardware`.

#![cfg(feature = "visa")]

use tektronixsg::sys::visa::VisaResourceManager;
use tektronixsg::{candidates, DeviceConfiguration, EditMemory, Variant, VisaDevice,
                  TEKTRONIX_VENDOR_ID};

macro_rules! require_hardware {
    () => {
        if std::env::var_os("TEKTRONIXSG_HARDWARE").is_none() {
            eprintln!("skipped: TEKTRONIXSG_HARDWARE is not set");
            return
        }
        let _ = env_logger::builder().is_test(true).try_init();
    };
}

fn connect() -> VisaDevice {
    let config = DeviceConfiguration::default();
    let rm = VisaResourceManager::new().unwrap();
    VisaDevice::connect(&rm, None, config).unwrap()
}

#[test]
fn list_devices() {
    require_hardware!();
    let rm = VisaResourceManager::new().unwrap();
    assert_eq!(candidates(&rm, TEKTRONIX_VENDOR_ID).unwrap().len(), 1);
}

#[test]
fn identify() {
    require_hardware!();
    let mut device = connect();
    let response = device.identify().unwrap();
    assert!(response.contains(device.model()));
}

#[test]
fn reset() {
    require_hardware!();
    let mut device = connect();
    device.channel(1).unwrap().set_voltage_max(3.0).unwrap();
    device.reset().unwrap();
    assert_eq!(device.channel(1).unwrap().voltage_max().unwrap(), 0.5);
}

#[test]
fn send_trigger() {
    require_hardware!();
    let mut device = connect();
    device.send_trigger().unwrap();
    device.reset().unwrap();
}

#[test]
fn wait() {
    require_hardware!();
    let mut device = connect();
    device.wait().unwrap();
    device.reset().unwrap();
}

#[test]
fn edit_memory() {
    require_hardware!();
    let mut device = connect();
    match device.variant() {
        Variant::Afg31000 => {
            let first = [0, 5000, 14000];
            device.write_arbitrary_memory(&first, EditMemory::One).unwrap();
            assert_eq!(device.read_arbitrary_memory(EditMemory::One).unwrap(), first);
            let second = [0, 1000, 2000, 5000, 10000];
            device.write_arbitrary_memory(&second, EditMemory::Two).unwrap();
            assert_eq!(device.read_arbitrary_memory(EditMemory::Two).unwrap(), second);
            assert_ne!(device.read_arbitrary_memory(EditMemory::One).unwrap(), second);
        }
        Variant::Afg1000 => {
            let samples = [0, 5000];
            device.write_arbitrary_memory(&samples, EditMemory::One).unwrap();
            assert_eq!(device.read_arbitrary_memory(EditMemory::One).unwrap(), samples);
        }
    }
}

#[test]
fn arbitrary_signal() {
    require_hardware!();
    let mut device = connect();
    let mut channel = device.channel(1).unwrap();
    channel.set_arbitrary_signal(&[1.0, 2.0, 3.0, 4.0, 2.0, 1.0, 1.5, 1.6, 1.7]).unwrap();
    assert_eq!(channel.voltage_amplitude().unwrap(), 3.0);
    assert_eq!(channel.voltage_offset().unwrap(), 2.5);
    device.reset().unwrap();
}
