//! Finding instruments among the resources visible to the bus library.

use crate::Result;
use crate::sys::ResourceManager;

/// Extract the USB vendor id from a resource address such as `USB0::0x0699::0x0353::C012345::INSTR`
/// or `USB0::1689::851::C012345::0::INSTR`. Returns `None` for non-USB resources.
pub fn manufacturer_id(resource: &str) -> Option<u16> {
    let mut fields = resource.split("::");
    let interface = fields.next()?;
    if !interface.to_ascii_uppercase().starts_with("USB") {
        return None
    }
    let vendor = fields.next()?.trim();
    match vendor.strip_prefix("0x").or_else(|| vendor.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => vendor.parse::<u16>().ok(),
    }
}

/// List every resource visible to `rm`.
pub fn list_resources<R: ResourceManager>(rm: &R) -> Result<Vec<String>> {
    let resources = rm.list_resources()?;
    log::debug!("list_resources() = {:?}", resources);
    Ok(resources)
}

/// Resources made by the manufacturer with the given vendor id, in enumeration order.
pub fn candidates<R: ResourceManager>(rm: &R, vendor_id: u16) -> Result<Vec<String>> {
    Ok(list_resources(rm)?
        .into_iter()
        .filter(|resource| manufacturer_id(resource) == Some(vendor_id))
        .collect())
}

/// Pick the first resource made by the manufacturer with the given vendor id.
pub fn select_resource<'a, I>(resources: I, vendor_id: u16) -> Option<&'a str>
        where I: IntoIterator<Item = &'a str> {
    resources.into_iter().find(|resource| manufacturer_id(resource) == Some(vendor_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TEKTRONIX_VENDOR_ID;
    use crate::sys::loopback::LoopbackResourceManager;

    #[test]
    fn vendor_id() {
        assert_eq!(manufacturer_id("USB0::0x0699::0x0353::C012345::INSTR"), Some(0x0699));
        assert_eq!(manufacturer_id("USB0::1689::851::C012345::0::INSTR"), Some(1689));
        assert_eq!(manufacturer_id("usb0::0X0699::0x0353::C012345::INSTR"), Some(0x0699));
        assert_eq!(manufacturer_id("TCPIP0::192.168.1.10::INSTR"), None);
        assert_eq!(manufacturer_id("ASRL1::INSTR"), None);
        assert_eq!(manufacturer_id("USB0::zzz::0x0353::INSTR"), None);
    }

    #[test]
    fn select() {
        let resources = [
            "ASRL1::INSTR",
            "USB0::0x1AB1::0x0642::DG1ZA000000001::INSTR",
            "USB0::1689::851::C000001::0::INSTR",
            "USB0::0x0699::0x0353::C000002::INSTR",
        ];
        assert_eq!(select_resource(resources, TEKTRONIX_VENDOR_ID),
                   Some("USB0::1689::851::C000001::0::INSTR"));
        assert_eq!(select_resource(resources[..2].iter().copied(), TEKTRONIX_VENDOR_ID), None);
    }

    #[test]
    fn candidates_from_manager() {
        let rm = LoopbackResourceManager::new()
            .with_instrument("ASRL1::INSTR", "AFG1022")
            .with_instrument("USB0::0x0699::0x0353::C000002::INSTR", "AFG31052");
        assert_eq!(list_resources(&rm).unwrap().len(), 2);
        assert_eq!(candidates(&rm, TEKTRONIX_VENDOR_ID).unwrap(),
                   vec!["USB0::0x0699::0x0353::C000002::INSTR".to_owned()]);
    }
}
