//! Domain contract violations.

use crate::model::change::EntityKind;
use crate::model::device::DeviceKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors raised by household, room and device operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    RoomNotFound(u32),
    SolarPanelNotFound(u32),
    DeviceNotFound { room_id: u32, device_id: u32 },
    /// An entity with the same id already lives in the target collection.
    IdInUse { kind: EntityKind, id: u32 },
    /// Device belongs to a different room than the one it is added to.
    OwnerMismatch { room_id: u32, owner_id: u32 },
    /// Consumption variant does not match the device kind.
    ConsumptionTypeMismatch {
        expected: DeviceKind,
        found: DeviceKind,
    },
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomNotFound(id) => write!(f, "room not found: {id}"),
            Self::SolarPanelNotFound(id) => write!(f, "solar panel not found: {id}"),
            Self::DeviceNotFound { room_id, device_id } => {
                write!(f, "device {device_id} not found in room {room_id}")
            }
            Self::IdInUse { kind, id } => write!(f, "{} id already in use: {id}", kind.as_str()),
            Self::OwnerMismatch { room_id, owner_id } => write!(
                f,
                "device owned by room {owner_id} cannot be added to room {room_id}"
            ),
            Self::ConsumptionTypeMismatch { expected, found } => write!(
                f,
                "{} device requires {} consumption, got {}",
                expected.as_str(),
                expected.consumption_name(),
                found.consumption_name()
            ),
        }
    }
}

impl Error for DomainError {}
