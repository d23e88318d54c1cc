/// One button reading pulled out of an RB50 advertisement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reading {
    pub address: String,
    /// Free-running counter bumped by the beacon on every press. Wraps at 256.
    pub control_byte: u8,
    pub rssi: i8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Data,
    Warning,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Data => "RB50 Data",
            EventKind::Warning => "RB50 Warning",
        }
    }
}

/// Wire layout shared by both events. Every value is a string.
#[derive(Debug)]
pub struct ReadingPayload {
    pub address: String,
    pub control_byte: String,
    pub rssi: String,
}

impl ReadingPayload {
    /// Renders the fixed text layout the hub has always published, e.g.
    /// `{ "address": "..", "controlByte": "0A", "rssi": "-67" }`.
    pub fn render(&self) -> serde_json::Result<String> {
        Ok(format!(
            "{{ \"address\": {}, \"controlByte\": {}, \"rssi\": {} }}",
            serde_json::to_string(&self.address)?,
            serde_json::to_string(&self.control_byte)?,
            serde_json::to_string(&self.rssi)?,
        ))
    }
}

impl From<&Reading> for ReadingPayload {
    fn from(reading: &Reading) -> Self {
        ReadingPayload {
            address: reading.address.clone(),
            control_byte: format!("{:02X}", reading.control_byte),
            rssi: reading.rssi.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(EventKind::Data.name(), "RB50 Data");
        assert_eq!(EventKind::Warning.name(), "RB50 Warning");
    }

    #[test]
    fn test_payload_formatting() {
        let reading = Reading {
            address: "C0:FF:EE:00:11:22".to_string(),
            control_byte: 0x0A,
            rssi: -67,
        };
        let payload = ReadingPayload::from(&reading);
        assert_eq!(payload.control_byte, "0A");
        assert_eq!(payload.rssi, "-67");
        assert_eq!(
            payload.render().unwrap(),
            r#"{ "address": "C0:FF:EE:00:11:22", "controlByte": "0A", "rssi": "-67" }"#
        );
    }

    #[test]
    fn test_payload_is_valid_json() {
        let reading = Reading {
            address: "odd\"address".to_string(),
            control_byte: 0xFF,
            rssi: 0,
        };
        let rendered = ReadingPayload::from(&reading).render().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["address"], "odd\"address");
        assert_eq!(value["controlByte"], "FF");
        assert_eq!(value["rssi"], "0");
    }
}
