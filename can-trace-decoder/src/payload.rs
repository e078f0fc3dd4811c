//! Fixed-layout payload decoding
//!
//! Flyer lift controllers report their state in a 20-byte payload. All
//! 16-bit fields are big-endian; positions are transmitted in hundredths.
//!
//! | Field              | Bytes   | Transform |
//! |--------------------|---------|-----------|
//! | targetPosition     | [0,1]   | ÷ 100.0   |
//! | presentPosition    | [2,3]   | ÷ 100.0   |
//! | presentRPM         | [4,5]   | integer   |
//! | appliedDuty        | [6,7]   | integer   |
//! | FETtemp            | [8]     | raw byte  |
//! | MOTtemp            | [9]     | raw byte  |
//! | busCurrentADC      | [10,11] | integer   |
//! | busVoltageADC      | [12,13] | integer   |
//! | liftDirection      | [14]    | raw byte  |
//! | GBPresentPosition  | [15,16] | ÷ 100.0   |
//! | encPresentPosition | [17,18] | ÷ 100.0   |
//! | usingPosition      | [19]    | raw byte  |

use crate::types::{LineError, SignalValue};
use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Minimum payload length of a lift status frame
pub const FLYER_PAYLOAD_LEN: usize = 20;

/// Scale of position fields (hundredths)
const POSITION_SCALE: f64 = 100.0;

/// Decodes a payload hex string into typed signals
pub trait PayloadDecoder: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Decode one payload
    fn decode(&self, payload_hex: &str) -> Result<PayloadSignals, LineError>;
}

/// Decoded payload signals, one variant per payload layout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadSignals {
    FlyerLift(FlyerLiftSignals),
}

impl PayloadSignals {
    /// Value of one numeric field, if this layout carries it
    pub fn value(&self, field: NumericField) -> Option<SignalValue> {
        match self {
            PayloadSignals::FlyerLift(signals) => Some(signals.value(field)),
        }
    }

    /// All fields carried by this layout, in payload order
    pub fn fields(&self) -> Vec<(NumericField, SignalValue)> {
        match self {
            PayloadSignals::FlyerLift(signals) => NumericField::ALL
                .iter()
                .map(|field| (*field, signals.value(*field)))
                .collect(),
        }
    }
}

/// Lift controller status signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlyerLiftSignals {
    #[serde(rename = "targetPosition")]
    pub target_position: f64,
    #[serde(rename = "presentPosition")]
    pub present_position: f64,
    #[serde(rename = "presentRPM")]
    pub present_rpm: u16,
    #[serde(rename = "appliedDuty")]
    pub applied_duty: u16,
    #[serde(rename = "FETtemp")]
    pub fet_temp: u8,
    #[serde(rename = "MOTtemp")]
    pub mot_temp: u8,
    #[serde(rename = "busCurrentADC")]
    pub bus_current_adc: u16,
    #[serde(rename = "busVoltageADC")]
    pub bus_voltage_adc: u16,
    #[serde(rename = "liftDirection")]
    pub lift_direction: u8,
    #[serde(rename = "GBPresentPosition")]
    pub gb_present_position: f64,
    #[serde(rename = "encPresentPosition")]
    pub enc_present_position: f64,
    #[serde(rename = "usingPosition")]
    pub using_position: u8,
}

impl FlyerLiftSignals {
    /// Decode the fixed layout from raw bytes (at least 20)
    pub fn from_bytes(data: &[u8]) -> Result<Self, LineError> {
        if data.len() < FLYER_PAYLOAD_LEN {
            return Err(LineError::PayloadDecode(format!(
                "lift payload needs {} bytes, got {}",
                FLYER_PAYLOAD_LEN,
                data.len()
            )));
        }

        let word = |offset: usize| BigEndian::read_u16(&data[offset..offset + 2]);
        let position = |offset: usize| f64::from(word(offset)) / POSITION_SCALE;

        Ok(Self {
            target_position: position(0),
            present_position: position(2),
            present_rpm: word(4),
            applied_duty: word(6),
            fet_temp: data[8],
            mot_temp: data[9],
            bus_current_adc: word(10),
            bus_voltage_adc: word(12),
            lift_direction: data[14],
            gb_present_position: position(15),
            enc_present_position: position(17),
            using_position: data[19],
        })
    }

    pub fn value(&self, field: NumericField) -> SignalValue {
        use NumericField::*;
        let int = |v: i64| SignalValue::Integer(v);
        match field {
            TargetPosition => SignalValue::Float(self.target_position),
            PresentPosition => SignalValue::Float(self.present_position),
            PresentRpm => int(self.present_rpm.into()),
            AppliedDuty => int(self.applied_duty.into()),
            FetTemp => int(self.fet_temp.into()),
            MotTemp => int(self.mot_temp.into()),
            BusCurrentAdc => int(self.bus_current_adc.into()),
            BusVoltageAdc => int(self.bus_voltage_adc.into()),
            LiftDirection => int(self.lift_direction.into()),
            GbPresentPosition => SignalValue::Float(self.gb_present_position),
            EncPresentPosition => SignalValue::Float(self.enc_present_position),
            UsingPosition => int(self.using_position.into()),
        }
    }
}

/// Decoder for the Flyer lift status layout
#[derive(Debug, Clone, Copy, Default)]
pub struct FlyerLiftDecoder;

impl PayloadDecoder for FlyerLiftDecoder {
    fn name(&self) -> &'static str {
        "flyer-lift"
    }

    fn decode(&self, payload_hex: &str) -> Result<PayloadSignals, LineError> {
        let data = hex::decode(payload_hex)
            .map_err(|e| LineError::PayloadDecode(format!("{:?}: {}", payload_hex, e)))?;
        FlyerLiftSignals::from_bytes(&data).map(PayloadSignals::FlyerLift)
    }
}

/// Numeric fields that can be selected for projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NumericField {
    TargetPosition,
    PresentPosition,
    PresentRpm,
    AppliedDuty,
    FetTemp,
    MotTemp,
    BusCurrentAdc,
    BusVoltageAdc,
    LiftDirection,
    GbPresentPosition,
    EncPresentPosition,
    UsingPosition,
}

impl NumericField {
    /// All fields, in payload order
    pub const ALL: [NumericField; 12] = [
        NumericField::TargetPosition,
        NumericField::PresentPosition,
        NumericField::PresentRpm,
        NumericField::AppliedDuty,
        NumericField::FetTemp,
        NumericField::MotTemp,
        NumericField::BusCurrentAdc,
        NumericField::BusVoltageAdc,
        NumericField::LiftDirection,
        NumericField::GbPresentPosition,
        NumericField::EncPresentPosition,
        NumericField::UsingPosition,
    ];

    /// Column name used in exports
    pub fn name(&self) -> &'static str {
        match self {
            NumericField::TargetPosition => "targetPosition",
            NumericField::PresentPosition => "presentPosition",
            NumericField::PresentRpm => "presentRPM",
            NumericField::AppliedDuty => "appliedDuty",
            NumericField::FetTemp => "FETtemp",
            NumericField::MotTemp => "MOTtemp",
            NumericField::BusCurrentAdc => "busCurrentADC",
            NumericField::BusVoltageAdc => "busVoltageADC",
            NumericField::LiftDirection => "liftDirection",
            NumericField::GbPresentPosition => "GBPresentPosition",
            NumericField::EncPresentPosition => "encPresentPosition",
            NumericField::UsingPosition => "usingPosition",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumericField {
    type Err = String;

    /// Case-insensitive match on the export column name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NumericField::ALL
            .iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown numeric field '{}'", s))
    }
}
