use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure reported by the device while acquiring a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    /// The user or OS refused access to location
    PermissionDenied,
    /// The device could not determine a position (no signal, bad fix, etc)
    PositionUnavailable,
    /// No fix was acquired within the acquisition timeout
    Timeout,
}

impl PositionError {
    /// Map a numeric geolocation error code (1 = permission, 2 = unavailable, 3 = timeout).
    /// Unknown codes are treated as the position being unavailable.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::PermissionDenied => 1,
            Self::PositionUnavailable => 2,
            Self::Timeout => 3,
        }
    }
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&SamplerError::from(*self), f)
    }
}

impl std::error::Error for PositionError {}

/// Error conditions surfaced to whoever is presenting the sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerError {
    /// The device has no location capability at all, fatal for the session
    CapabilityUnavailable,
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// `start` was called while a subscription is already active
    AlreadyActive,
}

impl SamplerError {
    /// Whether the user can reasonably try again in this session
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::PositionUnavailable | Self::Timeout
        )
    }
}

impl From<PositionError> for SamplerError {
    fn from(value: PositionError) -> Self {
        match value {
            PositionError::PermissionDenied => Self::PermissionDenied,
            PositionError::PositionUnavailable => Self::PositionUnavailable,
            PositionError::Timeout => Self::Timeout,
        }
    }
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::CapabilityUnavailable => "Geolocation is not supported on this device.",
            Self::PermissionDenied => {
                "Permission to read your location was denied. Please allow access and try again."
            }
            Self::PositionUnavailable => "Failed to get your location. Please try again.",
            Self::Timeout => "Timed out waiting for a location fix. Please try again.",
            Self::AlreadyActive => "Location tracking is already running.",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for SamplerError {}
