// Telemetry sample domain models
use super::error::AnalysisError;
use std::fmt;
use std::str::FromStr;

/// Canonical telemetry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Elapsed time in seconds.
    Time,
    /// Altitude in meters, instrument frame.
    Altitude,
    /// Primary-axis acceleration in g.
    Acceleration,
    /// Lateral acceleration in g.
    AccelerationX,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Time,
        Field::Altitude,
        Field::Acceleration,
        Field::AccelerationX,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Altitude => "altitude",
            Self::Acceleration => "acceleration",
            Self::AccelerationX => "acceleration-X",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = AnalysisError;

    /// Accepts the canonical names plus the short spellings older flight logs use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "time" => Ok(Self::Time),
            "altitude" | "alt" => Ok(Self::Altitude),
            "acceleration" | "accel" => Ok(Self::Acceleration),
            "acceleration-X" | "accel-X" | "accelerationX" | "acceleration_x" => {
                Ok(Self::AccelerationX)
            }
            other => Err(AnalysisError::unknown_field(other)),
        }
    }
}

/// One telemetry record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub row: usize,
    pub time: f64,
    pub altitude: f64,
    pub acceleration: f64,
    pub acceleration_x: f64,
}

impl Sample {
    pub fn new(row: usize, time: f64, altitude: f64, acceleration: f64, acceleration_x: f64) -> Self {
        Self {
            row,
            time,
            altitude,
            acceleration,
            acceleration_x,
        }
    }

    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Time => self.time,
            Field::Altitude => self.altitude,
            Field::Acceleration => self.acceleration,
            Field::AccelerationX => self.acceleration_x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_aliases() {
        assert_eq!("alt".parse::<Field>().unwrap(), Field::Altitude);
        assert_eq!("accel".parse::<Field>().unwrap(), Field::Acceleration);
        assert_eq!("accel-X".parse::<Field>().unwrap(), Field::AccelerationX);
        assert_eq!(" time ".parse::<Field>().unwrap(), Field::Time);
    }

    #[test]
    fn test_unknown_field() {
        let err = "velocity".parse::<Field>().unwrap_err();
        assert_eq!(err, AnalysisError::UnknownField("velocity".to_string()));
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
    }
}
