//! Test definition table.
//!
//! The set of certification tests is closed and known at build time.  Each
//! [`TestId`] maps to exactly one [`TestDefinition`], which is a tagged
//! variant: a **remote** test does a real command/result round-trip over the
//! messaging gateway, a **simulated** test succeeds locally after a fixed
//! delay.  The orchestrator dispatches on the variant only, so adding a test
//! is a new row here, never a new branch in the service.
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────────┐
//! │ TestId        │ Definition                                   │
//! ├───────────────┼──────────────────────────────────────────────┤
//! │ buzzer        │ Remote   { "buzzer_test",   name/status }    │
//! │ doors         │ Remote   { "door_test",     + doors_failed } │
//! │ bay_door      │ Remote   { "bay_door_test", name/status }    │
//! │ ups           │ Simulated{ 1200 ms }                         │
//! │ network_speed │ Simulated{ 1200 ms }                         │
//! └───────────────┴──────────────────────────────────────────────┘
//! ```

use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Test identity
// ---------------------------------------------------------------------------

/// Every certification test, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TestId {
    Buzzer = 0,
    Doors = 1,
    BayDoor = 2,
    Ups = 3,
    NetworkSpeed = 4,
}

impl TestId {
    /// Total number of tests; sizes the per-session status array.
    pub const COUNT: usize = 5;

    /// Display order.  Execution order is operator-driven.
    pub const ALL: [TestId; Self::COUNT] = [
        Self::Buzzer,
        Self::Doors,
        Self::BayDoor,
        Self::Ups,
        Self::NetworkSpeed,
    ];

    /// Position in [`TestId::ALL`] and in the session status array.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable machine key, as used on the command line and in snapshots.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Buzzer => "buzzer",
            Self::Doors => "doors",
            Self::BayDoor => "bay_door",
            Self::Ups => "ups",
            Self::NetworkSpeed => "network_speed",
        }
    }

    /// Human label shown to the operator.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buzzer => "Buzzer",
            Self::Doors => "Doors",
            Self::BayDoor => "Bay Door",
            Self::Ups => "UPS",
            Self::NetworkSpeed => "Network Speed",
        }
    }

    /// Look up this test's row in the definition table.
    pub fn definition(self) -> &'static TestDefinition {
        &DEFINITIONS[self.index()]
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when a string names no known test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTest(pub String);

impl fmt::Display for UnknownTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown test '{}'", self.0)
    }
}

impl std::error::Error for UnknownTest {}

impl FromStr for TestId {
    type Err = UnknownTest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownTest(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// How a test is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDefinition {
    /// Publish a command to the pod and read back its result record.
    Remote(RemoteTest),
    /// No gateway interaction: succeed after a fixed delay.
    Simulated(SimulatedTest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTest {
    /// Value of the `action` field in the published command.
    pub command_tag: &'static str,
    /// Field names to try, in priority order, when reading the result.
    pub fields: FieldSynonyms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedTest {
    pub delay: Duration,
}

/// Prioritised field-name synonyms for one result record shape.
///
/// Firmware versions disagree on field casing, so every logical field is
/// a list; the first name present in the record wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSynonyms {
    pub test_name: &'static [&'static str],
    pub test_status: &'static [&'static str],
    pub metrics: &'static [MetricField],
}

/// A test-specific numeric detail, e.g. how many doors failed to actuate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricField {
    /// Canonical name used in [`TestResult`](crate::session::TestResult).
    pub name: &'static str,
    pub synonyms: &'static [&'static str],
}

pub const TEST_NAME_FIELDS: &[&str] = &["Test", "test", "action"];
pub const TEST_STATUS_FIELDS: &[&str] = &["Test_Status", "test_status", "status"];

pub const DOORS_FAILED: MetricField = MetricField {
    name: "doors_failed",
    synonyms: &["doors_failed", "Doors_Failed"],
};

/// The status value (case-insensitive) that marks a test as passed.
pub const COMPLETED_STATUS: &str = "completed";

const SIMULATED_DELAY: Duration = Duration::from_millis(1200);

const BASIC_FIELDS: FieldSynonyms = FieldSynonyms {
    test_name: TEST_NAME_FIELDS,
    test_status: TEST_STATUS_FIELDS,
    metrics: &[],
};

const DOOR_FIELDS: FieldSynonyms = FieldSynonyms {
    test_name: TEST_NAME_FIELDS,
    test_status: TEST_STATUS_FIELDS,
    metrics: &[DOORS_FAILED],
};

/// Indexed by `TestId as usize`.  Must stay in sync with [`TestId::ALL`].
static DEFINITIONS: [TestDefinition; TestId::COUNT] = [
    // 0: Buzzer
    TestDefinition::Remote(RemoteTest {
        command_tag: "buzzer_test",
        fields: BASIC_FIELDS,
    }),
    // 1: Doors
    TestDefinition::Remote(RemoteTest {
        command_tag: "door_test",
        fields: DOOR_FIELDS,
    }),
    // 2: Bay door
    TestDefinition::Remote(RemoteTest {
        command_tag: "bay_door_test",
        fields: BASIC_FIELDS,
    }),
    // 3: UPS
    TestDefinition::Simulated(SimulatedTest {
        delay: SIMULATED_DELAY,
    }),
    // 4: Network speed
    TestDefinition::Simulated(SimulatedTest {
        delay: SIMULATED_DELAY,
    }),
];
