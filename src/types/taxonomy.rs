//! The step/operation event taxonomy.
//!
//! Both enumerations are closed over the known catalogue but carry an `Other`
//! variant so that free-form tags from call sites are logged verbatim instead of
//! being dropped.

use derive_more::Display;
use internment::Intern;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::Infallible, str::FromStr};

/// Tag used when a call site hands over an empty step or operation.
pub const UNKNOWN: &str = "UNKNOWN";

/// Coarse category of an event.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Step {
    #[display("AUTH")]
    Auth,
    #[display("VIEW")]
    View,
    #[display("INTERACTION")]
    Interaction,
    #[display("NAVIGATION")]
    Navigation,
    #[display("API")]
    Api,
    #[display("DATABASE")]
    Database,
    #[display("SYSTEM")]
    System,
    #[display("{}", _0.as_str())]
    Other(Intern<String>),
}

impl Step {
    pub const CATALOGUE: &'static [Step] = &[
        Step::Auth,
        Step::View,
        Step::Interaction,
        Step::Navigation,
        Step::Api,
        Step::Database,
        Step::System,
    ];

    fn from_canonical(name: &str) -> Option<Self> {
        Some(match name {
            "AUTH" => Step::Auth,
            "VIEW" => Step::View,
            "INTERACTION" => Step::Interaction,
            "NAVIGATION" => Step::Navigation,
            "API" => Step::Api,
            "DATABASE" => Step::Database,
            "SYSTEM" => Step::System,
            _ => return None,
        })
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Step::Other(_))
    }
}

macro_rules! operations {
    ($($step:ident => { $($variant:ident = $name:literal),* $(,)? })*) => {
        /// Specific named occurrence within a [`Step`].
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        pub enum Operation {
            $($($variant,)*)*
            Other(Intern<String>),
        }

        impl Operation {
            pub const CATALOGUE: &'static [Operation] = &[$($(Operation::$variant,)*)*];

            pub fn as_str(&self) -> &str {
                match self {
                    $($(Operation::$variant => $name,)*)*
                    Operation::Other(name) => name.as_str(),
                }
            }

            /// The step this operation belongs to, `None` for free-form operations.
            pub fn step(&self) -> Option<Step> {
                match self {
                    $($(Operation::$variant => Some(Step::$step),)*)*
                    Operation::Other(_) => None,
                }
            }

            fn from_canonical(name: &str) -> Option<Self> {
                match name {
                    $($($name => Some(Operation::$variant),)*)*
                    _ => None,
                }
            }
        }
    };
}

operations! {
    Auth => {
        LoginAttempt = "LOGIN_ATTEMPT",
        LoginSuccess = "LOGIN_SUCCESS",
        LoginFailed = "LOGIN_FAILED",
        Logout = "LOGOUT",
        RegisterAttempt = "REGISTER_ATTEMPT",
        RegisterSuccess = "REGISTER_SUCCESS",
        RegisterFailed = "REGISTER_FAILED",
    }
    View => {
        ViewHome = "VIEW_HOME",
        ViewPostDetails = "VIEW_POST_DETAILS",
        ViewLoginPage = "VIEW_LOGIN_PAGE",
        ViewRegisterPage = "VIEW_REGISTER_PAGE",
    }
    Interaction => {
        SubmitComment = "SUBMIT_COMMENT",
        SubmitReply = "SUBMIT_REPLY",
        LikePost = "LIKE_POST",
        Search = "SEARCH",
    }
    Navigation => {
        NavigateToPost = "NAVIGATE_TO_POST",
        NavigateToHome = "NAVIGATE_TO_HOME",
    }
    Api => {
        ApiGetPost = "API_GET_POST",
        ApiGetPostFailed = "API_GET_POST_FAILED",
        ApiGetReplies = "API_GET_REPLIES",
        ApiGetRepliesFailed = "API_GET_REPLIES_FAILED",
        ApiUnauthorized = "API_UNAUTHORIZED",
    }
    Database => {
        DbQuerySuccess = "DB_QUERY_SUCCESS",
        DbQueryFailed = "DB_QUERY_FAILED",
        DbMutationSuccess = "DB_MUTATION_SUCCESS",
        DbMutationFailed = "DB_MUTATION_FAILED",
    }
    System => {
        TransportDegraded = "TRANSPORT_DEGRADED",
    }
}

impl Operation {
    pub fn is_known(&self) -> bool {
        !matches!(self, Operation::Other(_))
    }
}

/// Returns true if the pair is drawn from the fixed taxonomy.
pub fn is_canonical(step: &Step, operation: &Operation) -> bool {
    operation.step().as_ref() == Some(step)
}

/// Trimmed tag and its canonical (upper case) spelling. Empty tags become [`UNKNOWN`].
fn normalize(name: &str) -> (&str, String) {
    let name = name.trim();
    if name.is_empty() {
        (UNKNOWN, UNKNOWN.to_owned())
    } else {
        (name, name.to_ascii_uppercase())
    }
}

impl From<&str> for Step {
    fn from(name: &str) -> Self {
        let (verbatim, canonical) = normalize(name);
        Step::from_canonical(&canonical)
            .unwrap_or_else(|| Step::Other(Intern::new(verbatim.to_owned())))
    }
}

impl From<String> for Step {
    fn from(name: String) -> Self {
        Step::from(name.as_str())
    }
}

impl FromStr for Step {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Step::from(s))
    }
}

impl From<&str> for Operation {
    fn from(name: &str) -> Self {
        let (verbatim, canonical) = normalize(name);
        Operation::from_canonical(&canonical)
            .unwrap_or_else(|| Operation::Other(Intern::new(verbatim.to_owned())))
    }
}

impl From<String> for Operation {
    fn from(name: String) -> Self {
        Operation::from(name.as_str())
    }
}

impl FromStr for Operation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Operation::from(s))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Step::from)
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Operation::from)
    }
}
