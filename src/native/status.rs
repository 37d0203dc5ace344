//! Native result codes.
//!
//! Every call into the device-control library reports an integer status.
//! Zero is success; negative values are errors with a fixed meaning shared
//! across all camera drivers.

use std::fmt;

/// A non-OK integer status returned by the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i32);

impl Status {
    /// Success.
    pub const OK: i32 = 0;
    /// Generic error.
    pub const ERROR: Status = Status(-1);
    /// Bad parameters passed.
    pub const BAD_PARAMETERS: Status = Status(-2);
    /// Out of memory.
    pub const NO_MEMORY: Status = Status(-3);
    /// The requested port is unknown.
    pub const UNKNOWN_PORT: Status = Status(-5);
    /// Functionality not supported.
    pub const NOT_SUPPORTED: Status = Status(-6);
    /// Generic I/O error.
    pub const IO: Status = Status(-7);
    /// The device is no longer on the USB bus.
    pub const IO_USB_FIND: Status = Status(-52);
    /// Model not found.
    pub const MODEL_NOT_FOUND: Status = Status(-105);
    /// The camera is busy.
    pub const CAMERA_BUSY: Status = Status(-110);

    /// Wraps a raw code. Returns `None` for success codes (zero or positive).
    pub fn from_code(code: i32) -> Option<Self> {
        (code < Self::OK).then_some(Status(code))
    }

    /// Converts a raw code into a `Result`, passing non-negative values
    /// through (several calls return a count or an index on success).
    #[inline]
    pub fn check(code: i32) -> Result<i32, Status> {
        match Self::from_code(code) {
            Some(status) => Err(status),
            None => Ok(code),
        }
    }

    /// Returns the raw integer code.
    #[inline]
    pub fn code(self) -> i32 {
        self.0
    }

    /// Human-readable description of the code.
    pub fn description(self) -> &'static str {
        match self.0 {
            -1 => "Unspecified error",
            -2 => "Bad parameters",
            -3 => "Out of memory",
            -4 => "Error in library",
            -5 => "Unknown port",
            -6 => "Unsupported operation",
            -7 => "I/O problem",
            -8 => "Fixed limit exceeded",
            -10 => "Timeout reading from or writing to the port",
            -20 => "Serial port not supported",
            -21 => "USB port not supported",
            -31 => "Error initializing the port",
            -34 => "Error reading from the port",
            -35 => "Error writing to the port",
            -37 => "Error updating the port settings",
            -41 => "Error setting the serial port speed",
            -51 => "Error clearing a halt condition on the USB port",
            -52 => "Could not find the requested device on the USB port",
            -53 => "Could not claim the USB device",
            -60 => "Could not lock the device",
            -70 => "Unspecified error in hardware abstraction layer",
            -102 => "Corrupted data",
            -103 => "File exists",
            -105 => "Unknown model",
            -107 => "Directory not found",
            -108 => "File not found",
            -109 => "Directory exists",
            -110 => "Camera busy",
            -111 => "Path not absolute",
            -112 => "Cancelled",
            -113 => "Camera error",
            -114 => "OS failure",
            -115 => "Not enough space",
            _ => "Unknown error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_passes_counts_through() {
        assert_eq!(Status::check(0), Ok(0));
        assert_eq!(Status::check(3), Ok(3));
        assert_eq!(Status::check(-7), Err(Status::IO));
    }

    #[test]
    fn test_from_code_rejects_success() {
        assert!(Status::from_code(0).is_none());
        assert!(Status::from_code(12).is_none());
        assert_eq!(Status::from_code(-105), Some(Status::MODEL_NOT_FOUND));
    }

    #[test]
    fn test_display_includes_code() {
        assert_eq!(Status::CAMERA_BUSY.to_string(), "Camera busy (code -110)");
        assert_eq!(
            Status::from_code(-9999).unwrap().to_string(),
            "Unknown error (code -9999)"
        );
    }
}
