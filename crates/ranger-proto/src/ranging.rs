use serde::Serialize;

/// Target color classes, in enumeration order. The ordinal is what goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorClass {
    Red = 0,
    Yellow = 1,
    Blue = 2,
}

impl ColorClass {
    pub const ALL: [ColorClass; 3] = [ColorClass::Red, ColorClass::Yellow, ColorClass::Blue];

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Payload sent to the actuator controller. The pixel radius never leaves the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangingMessage {
    pub color: u8,
    #[serde(rename = "dist")]
    pub distance_cm: f64,
    #[serde(rename = "angle")]
    pub angle_deg: f64,
}

impl RangingMessage {
    pub fn new(class: ColorClass, distance_cm: f64, angle_deg: f64) -> Self {
        Self { color: class.ordinal(), distance_cm, angle_deg }
    }

    /// One JSON object per line: `{"color":0,"dist":-12.5,"angle":3.0}\n`.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = serde_json::to_vec(self)?;
        buf.push(b'\n');
        Ok(buf)
    }
}
