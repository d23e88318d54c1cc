//! RB50 advertisement recognition.
//!
//! The button advertises as `"iSensor "` and carries a device type marker and
//! the press counter inside its manufacturer specific data. Offsets are into
//! the raw AD payload, i.e. they count the two company identifier bytes.

use mac_address::MacAddress;

use crate::messages::Reading;

pub const TARGET_NAME: &str = "iSensor ";
pub const RB50_TYPE_ID: u8 = 0x36;
pub const TYPE_ID_OFFSET: usize = 4;
pub const CONTROL_BYTE_OFFSET: usize = 6;

/// A device reported by one scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub name: Option<String>,
    /// Raw manufacturer specific data, company identifier included.
    pub payload: Vec<u8>,
    pub rssi: i8,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvertisementMatch {
    Matched(Reading),
    NameMismatch,
    TypeMismatch(u8),
    AddressMismatch,
    TooShort(usize),
}

/// Fixed filter signature, optionally pinned to one beacon address.
#[derive(Debug, Clone, Default)]
pub struct BeaconFilter {
    address: Option<MacAddress>,
}

impl BeaconFilter {
    pub fn new(address: Option<MacAddress>) -> Self {
        BeaconFilter { address }
    }

    pub fn parse(&self, result: &ScanResult) -> AdvertisementMatch {
        if result.name.as_deref() != Some(TARGET_NAME) {
            return AdvertisementMatch::NameMismatch;
        }

        if result.payload.len() <= CONTROL_BYTE_OFFSET {
            return AdvertisementMatch::TooShort(result.payload.len());
        }

        let type_id = result.payload[TYPE_ID_OFFSET];
        if type_id != RB50_TYPE_ID {
            return AdvertisementMatch::TypeMismatch(type_id);
        }

        if let Some(address) = self.address {
            if !address.to_string().eq_ignore_ascii_case(&result.address) {
                return AdvertisementMatch::AddressMismatch;
            }
        }

        AdvertisementMatch::Matched(Reading {
            address: result.address.clone(),
            control_byte: result.payload[CONTROL_BYTE_OFFSET],
            rssi: result.rssi,
        })
    }
}

#[cfg(test)]
pub(crate) fn rb50_result(control_byte: u8) -> ScanResult {
    ScanResult {
        name: Some(TARGET_NAME.to_string()),
        payload: vec![0x3A, 0x05, 0x01, 0x00, RB50_TYPE_ID, 0x00, control_byte, 0x5C],
        rssi: -60,
        address: "C0:FF:EE:00:11:22".to_string(),
    }
}
