use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when an identifier cannot be parsed from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    pub kind: &'static str,
    pub raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! catalog_ids {
    ($($(#[$meta:meta])* $name:ident => $label:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
            #[serde(transparent)]
            pub struct $name(u64);

            impl $name {
                #[doc = concat!("Creates a new `", stringify!($name), "`")]
                #[must_use]
                pub fn new(id: u64) -> Self {
                    Self(id)
                }

                /// Returns the underlying u64 value
                #[must_use]
                pub fn value(&self) -> u64 {
                    self.0
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({})", stringify!($name), self.0)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = ParseIdError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim()
                        .parse::<u64>()
                        .map(Self::new)
                        .map_err(|_| ParseIdError {
                            kind: $label,
                            raw: s.to_owned(),
                        })
                }
            }

            impl<'de> Deserialize<'de> for $name {
                fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                    d.deserialize_any(IdVisitor($label)).map(Self::new)
                }
            }
        )*
    };
}

catalog_ids! {
    /// Unique identifier for a class (school year / grade level)
    ClassId => "class id",
    /// Unique identifier for an academic term
    TermId => "term id",
    /// Unique identifier for a subject
    SubjectId => "subject id",
    /// Unique identifier for a topic
    TopicId => "topic id",
    /// Unique identifier for a question
    QuestionId => "question id",
}

/// Accepts both JSON numbers and numeric strings.
///
/// Content files exported from JSON data servers frequently store ids as
/// strings (`"3"`), while score records use plain integers.
struct IdVisitor(&'static str);

impl serde::de::Visitor<'_> for IdVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a non-negative {} as number or numeric string", self.0)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom(format!("negative {}: {v}", self.0)))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<u64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid {}: {v:?}", self.0)))
    }
}
