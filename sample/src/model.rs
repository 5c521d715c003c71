//! Records and their identity.

use crate::error::{Result, SampleError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Deref;

/// Upper bound of the email column.
pub const MAX_EMAIL_LEN: usize = 254;

static EMAIL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// A value that can be stored in a `CrudStore`.
pub trait Record: Clone + Send + Sync + 'static {
  fn validate(&self) -> Result<()> {
    Ok(())
  }
}

/// A record together with the identifier assigned when it was first saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identified<R> {
  id: Option<i64>,
  record: R,
}

impl<R> Identified<R> {
  /// A record that has not been saved yet.
  pub fn new(record: R) -> Self {
    Self { id: None, record }
  }

  pub(crate) fn with_id(id: i64, record: R) -> Self {
    Self {
      id: Some(id),
      record,
    }
  }

  pub fn id(&self) -> Option<i64> {
    self.id
  }

  pub fn record(&self) -> &R {
    &self.record
  }

  pub fn record_mut(&mut self) -> &mut R {
    &mut self.record
  }

  pub fn into_record(self) -> R {
    self.record
  }
}

impl<R> Deref for Identified<R> {
  type Target = R;

  fn deref(&self) -> &R {
    &self.record
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyEntity {
  email: String,
}

impl MyEntity {
  pub fn new(email: impl Into<String>) -> Self {
    Self {
      email: email.into(),
    }
  }

  pub fn email(&self) -> &str {
    &self.email
  }

  pub fn set_email(&mut self, email: impl Into<String>) {
    self.email = email.into();
  }
}

impl Record for MyEntity {
  fn validate(&self) -> Result<()> {
    let invalid = |message: &str| SampleError::Validation {
      field: "email",
      message: message.to_string(),
    };

    if self.email.trim().is_empty() {
      return Err(invalid("must not be blank"));
    }
    if self.email.len() > MAX_EMAIL_LEN {
      return Err(invalid("must be at most 254 characters"));
    }
    if !EMAIL.is_match(&self.email) {
      return Err(invalid("is not a well-formed email address"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_validation() {
    assert!(MyEntity::new("user@example.com").validate().is_ok());
    assert!(MyEntity::new("   ").validate().is_err());
    assert!(MyEntity::new("not-an-email").validate().is_err());

    let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
    assert!(MyEntity::new(long).validate().is_err());
  }

  #[test]
  fn identified_derefs_to_record() {
    let entity = Identified::with_id(7, MyEntity::new("a@b.io"));
    assert_eq!(entity.id(), Some(7));
    assert_eq!(entity.email(), "a@b.io");
  }
}
