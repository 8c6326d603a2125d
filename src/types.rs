use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::phone::is_plausible_phone;
use crate::wizard::AuthError;

/// Phone number the wizard was started with.
///
/// Guaranteed plausible by construction: an optional leading `+` followed by
/// ASCII digits only. Surrounding whitespace is trimmed before the check.
/// Use `"+5511999990000".parse::<PhoneNumber>()` or `PhoneNumber::try_from(string)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = AuthError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let trimmed = s.trim();
        if is_plausible_phone(trimmed) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(AuthError::InvalidInput(format!(
                "'{trimmed}' is not a valid phone number"
            )))
        }
    }
}

impl From<PhoneNumber> for String {
    fn from(p: PhoneNumber) -> Self {
        p.0
    }
}

/// Backend user identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Third-party API application id the user authenticated with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct ApiId(pub i64);

/// Identity of one wizard run. Regenerated on every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct RunId(pub Ulid);

impl RunId {
    pub(crate) fn generate() -> Self {
        Self(Ulid::new())
    }
}
