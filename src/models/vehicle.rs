use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Vehicle class of a booking or a driver. Unknown names are kept as `Other`
/// so a quote can still be priced for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleClass {
    Car,
    Van,
    Truck,
    Other(String),
}

impl VehicleClass {
    pub fn rate_multiplier(&self) -> f64 {
        match self {
            VehicleClass::Truck => 2.0,
            VehicleClass::Van => 1.5,
            VehicleClass::Car => 1.2,
            VehicleClass::Other(_) => 1.0,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VehicleClass::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Van => "van",
            VehicleClass::Truck => "truck",
            VehicleClass::Other(name) => name,
        }
    }
}

impl From<String> for VehicleClass {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "car" => VehicleClass::Car,
            "van" => VehicleClass::Van,
            "truck" => VehicleClass::Truck,
            _ => VehicleClass::Other(raw),
        }
    }
}

impl From<VehicleClass> for String {
    fn from(class: VehicleClass) -> Self {
        class.as_str().to_string()
    }
}

impl FromStr for VehicleClass {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(VehicleClass::from(raw.to_string()))
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
