//! Typed ID wrappers for domain aggregates.
//!
//! Aggregates are keyed by numeric ids allocated by the persistence layer.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Creates an id from its raw value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }

            /// Returns true when the id has not been assigned yet.
            #[must_use]
            pub const fn is_zero(self) -> bool {
                self.0 == 0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

numeric_id!(
    /// Identifier of a medical scale.
    ScaleId
);
numeric_id!(
    /// Identifier of a questionnaire.
    QuestionnaireId
);
numeric_id!(
    /// Identifier of an assessment.
    AssessmentId
);
numeric_id!(
    /// Identifier of a testee (the person being assessed).
    TesteeId
);
numeric_id!(
    /// Identifier of an assessment plan.
    PlanId
);
numeric_id!(
    /// Identifier of an organization.
    OrgId
);
numeric_id!(
    /// Identifier of a submitted answer sheet.
    AnswerSheetId
);
numeric_id!(
    /// Identifier of an identity profile linked to a testee.
    ProfileId
);
numeric_id!(
    /// Identifier of a screening project.
    ScreeningProjectId
);
