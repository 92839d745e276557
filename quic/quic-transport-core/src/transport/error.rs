// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use core::fmt;

//= https://www.rfc-editor.org/rfc/rfc9000#section-20.1
//# This section lists the defined QUIC transport error codes that can be
//# used in a CONNECTION_CLOSE frame with a type of 0x1c.  These errors
//# apply to the entire connection.

/// A connection-level error, to be signaled to the peer in a CONNECTION_CLOSE frame
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Error {
    pub code: u64,
    pub frame_type: Option<u64>,
    pub reason: &'static str,
}

impl Error {
    /// Creates a new `Error`
    pub const fn new(code: u64) -> Self {
        Self {
            code,
            reason: "",
            frame_type: None,
        }
    }

    /// Updates the `Error` with the specified `frame_type`
    pub const fn with_frame_type(mut self, frame_type: u64) -> Self {
        self.frame_type = Some(frame_type);
        self
    }

    /// Updates the `Error` with the specified `reason`
    pub const fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = reason;
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.reason.is_empty() {
            self.reason.fmt(f)
        } else if let Some(description) = self.description() {
            description.fmt(f)
        } else {
            write!(f, "TransportError({})", self.code)
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("TransportError");

        d.field("code", &self.code);

        if let Some(description) = self.description() {
            d.field("description", &description);
        }

        if !self.reason.is_empty() {
            d.field("reason", &self.reason);
        }

        if let Some(frame_type) = self.frame_type {
            d.field("frame_type", &frame_type);
        }

        d.finish()
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Frame type of NEW_CONNECTION_ID, reported alongside errors raised while processing it
pub const NEW_CONNECTION_ID_FRAME_TYPE: u64 = 0x18;

/// Internal convenience macro for defining standard error codes
macro_rules! impl_errors {
    ($($(#[doc = $doc:expr])* $name:ident = $code:literal),* $(,)?) => {
        impl Error {
            $(
                $(#[doc = $doc])*
                pub const $name: Self = Self::new($code);
            )*

            pub fn description(&self) -> Option<&'static str> {
                match self.code {
                    $(
                        $code => Some(stringify!($name)),
                    )*
                    _ => None
                }
            }
        }

        #[test]
        fn description_test() {
            $(
                assert_eq!(&Error::$name.to_string(), stringify!($name));
            )*
        }
    };
}

impl_errors! {
    //= https://www.rfc-editor.org/rfc/rfc9000#section-20.1
    //# FRAME_ENCODING_ERROR (0x07):  An endpoint received a frame that was
    //#    badly formatted -- for instance, a frame of an unknown type or an
    //#    ACK frame that has more acknowledgment ranges than the remainder
    //#    of the packet could carry.
    /// An endpoint received a frame that was badly formatted.
    FRAME_ENCODING_ERROR = 0x7,

    //= https://www.rfc-editor.org/rfc/rfc9000#section-20.1
    //# CONNECTION_ID_LIMIT_ERROR (0x09):  The number of connection IDs
    //#    provided by the peer exceeds the advertised
    //#    active_connection_id_limit.
    /// The number of connection IDs provided by the peer exceeds the
    /// advertised active_connection_id_limit.
    CONNECTION_ID_LIMIT_ERROR = 0x9,

    //= https://www.rfc-editor.org/rfc/rfc9000#section-20.1
    //# PROTOCOL_VIOLATION (0x0a):  An endpoint detected an error with
    //#    protocol compliance that was not covered by more specific error
    //#    codes.
    /// An endpoint detected an error with protocol compliance that was
    /// not covered by more specific error codes.
    PROTOCOL_VIOLATION = 0xA,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_overrides_description() {
        let error = Error::PROTOCOL_VIOLATION.with_reason("bad frame");
        assert_eq!(error.to_string(), "bad frame");
        assert_eq!(error.description(), Some("PROTOCOL_VIOLATION"));
    }

    #[test]
    fn unknown_code() {
        assert_eq!(Error::new(0x4242).to_string(), "TransportError(16962)");
    }
}
