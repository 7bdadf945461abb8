//! Identifier newtypes
//!
//! [`Sid`] wraps the session id returned by `/session/login`. The value is a
//! bearer credential, so `Debug` and `Display` are redacted and the raw value
//! is only reachable through [`Sid::expose`].

use secrecy::{ExposeSecret, Secret};
use std::fmt;
use std::str::FromStr;

use crate::config::SecretValue;

/// Ambra session id
#[derive(Clone)]
pub struct Sid(Secret<SecretValue>);

impl Sid {
    /// Creates a new Sid
    ///
    /// # Examples
    ///
    /// ```
    /// use ambra_sdk::domain::Sid;
    ///
    /// let sid = Sid::new("1f4e0c3a-aaaa").unwrap();
    /// assert_eq!(sid.expose(), "1f4e0c3a-aaaa");
    /// assert_eq!(sid.to_string(), "Sid([REDACTED])");
    /// ```
    pub fn new(sid: impl Into<String>) -> Result<Self, String> {
        let sid = sid.into();
        if sid.trim().is_empty() {
            return Err("Session id cannot be empty".to_string());
        }
        Ok(Self(Secret::new(SecretValue::from(sid))))
    }

    /// Returns the raw session id for sending on the wire
    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_str()
    }
}

impl PartialEq for Sid {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Sid {}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sid([REDACTED])")
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sid([REDACTED])")
    }
}

impl FromStr for Sid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
