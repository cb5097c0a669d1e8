//! Cycle-scoped data model shared by the reconciliation engine and the
//! service: the fetched control document, the local sample, the document
//! written back, and the actuator commands.
//!
//! The remote store is schema-less and has historically received control
//! flags both as numbers and as strings, so control fields are modelled as
//! a tagged [`ControlValue`] with one central "equals one" predicate.

use embedded_hal::digital::PinState;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::pins::SENSOR_POLARITY;

/// A whole remote document as fetched or stored.
pub type Document = Value;

// ───────────────────────────────────────────────────────────────
// ControlValue
// ───────────────────────────────────────────────────────────────

/// A weakly typed control field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ControlValue {
    /// Key missing or explicitly `null`.
    #[default]
    Absent,
    Integer(i64),
    Text(String),
    /// Any other JSON shape, kept verbatim so it can be relayed unchanged.
    Other(Value),
}

impl ControlValue {
    /// `true` iff the value is the integer `1` or the string `"1"`.
    pub fn is_one(&self) -> bool {
        match self {
            Self::Integer(n) => *n == 1,
            Self::Text(s) => s == "1",
            Self::Absent | Self::Other(_) => false,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::String(s) => Self::Text(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Other(Value::Number(n)),
            },
            other => Self::Other(other),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Absent => Value::Null,
            Self::Integer(i) => Value::from(*i),
            Self::Text(s) => Value::String(s.clone()),
            Self::Other(v) => v.clone(),
        }
    }
}

impl Serialize for ControlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ControlValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

// ───────────────────────────────────────────────────────────────
// RemoteControlDocument
// ───────────────────────────────────────────────────────────────

/// The two control fields this device reads.  Every other key is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteControlDocument {
    #[serde(rename = "Sensor", default)]
    pub sensor: ControlValue,
    #[serde(rename = "Shutdown", default)]
    pub shutdown: ControlValue,
}

impl RemoteControlDocument {
    /// Interpret a fetched document.  Total: anything that is not a JSON
    /// object (including `null` for a never-written path) is the empty
    /// document.
    pub fn from_document(doc: &Document) -> Self {
        match doc {
            Value::Object(map) => Self {
                sensor: map
                    .get("Sensor")
                    .cloned()
                    .map_or(ControlValue::Absent, ControlValue::from_json),
                shutdown: map
                    .get("Shutdown")
                    .cloned()
                    .map_or(ControlValue::Absent, ControlValue::from_json),
            },
            _ => Self::default(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// LocalReading
// ───────────────────────────────────────────────────────────────

/// Raw input levels sampled once in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalReading {
    /// `ir1`..`ir6`.
    pub presence: [PinState; 6],
    pub flame: PinState,
}

impl Default for LocalReading {
    /// Every line undriven (pulled up), i.e. nothing detected.
    fn default() -> Self {
        Self {
            presence: [PinState::High; 6],
            flame: PinState::High,
        }
    }
}

impl LocalReading {
    pub fn presence_detected(&self) -> [bool; 6] {
        self.presence.map(|level| SENSOR_POLARITY.is_asserted(level))
    }

    pub fn flame_detected(&self) -> bool {
        SENSOR_POLARITY.is_asserted(self.flame)
    }
}

// ───────────────────────────────────────────────────────────────
// OutputDocument
// ───────────────────────────────────────────────────────────────

/// The document written back each cycle (full replace).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub ir1: bool,
    pub ir2: bool,
    pub ir3: bool,
    pub ir4: bool,
    pub ir5: bool,
    pub ir6: bool,
    pub flame_detected: bool,
    /// Relayed verbatim from this cycle's fetch; omitted when absent.
    #[serde(rename = "Sensor", skip_serializing_if = "ControlValue::is_absent")]
    pub sensor: ControlValue,
    /// Always the normalized `0` / `1`.
    #[serde(rename = "Shutdown")]
    pub shutdown: u8,
}

impl OutputDocument {
    pub fn presence(&self) -> [bool; 6] {
        [self.ir1, self.ir2, self.ir3, self.ir4, self.ir5, self.ir6]
    }

    /// Number of charging bays whose presence sensor reports a vehicle.
    pub fn occupied_bays(&self) -> u8 {
        self.presence().iter().filter(|&&p| p).count() as u8
    }

    pub fn to_document(&self) -> Document {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ───────────────────────────────────────────────────────────────
// ActuatorCommands
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommands {
    pub led_on: bool,
    pub relay_energized: bool,
}

impl ActuatorCommands {
    /// Power-on state: charger powered, indicator dark.
    pub const SAFE: Self = Self {
        led_on: false,
        relay_energized: true,
    };
}

impl Default for ActuatorCommands {
    fn default() -> Self {
        Self::SAFE
    }
}
