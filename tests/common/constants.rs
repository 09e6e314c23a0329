//! Shared constants for end-to-end tests
//!
//! When seeded care data or agent ids change, update only this file.

// ============================================================================
// Trigger Secret
// ============================================================================

/// Shared secret configured on every test server
pub const TEST_SECRET: &str = "test-agents-secret";

// ============================================================================
// Agent IDs
// ============================================================================

pub const LOW_STOCK_AUDIT: &str = "low-stock-audit";
pub const DAILY_SUMMARY: &str = "daily-summary";
pub const ATTENDANCE_AUDIT: &str = "attendance-audit";
pub const MESSAGE_ALERT: &str = "message-alert";

/// All built-in agent ids, sorted the way `GET /agents` lists them
pub const ALL_AGENT_IDS: [&str; 4] = [
    ATTENDANCE_AUDIT,
    DAILY_SUMMARY,
    LOW_STOCK_AUDIT,
    MESSAGE_ALERT,
];

// ============================================================================
// Seeded Care Data
// ============================================================================

/// Inventory items at or below their minimum stock ("Gloves", "Wipes")
pub const LOW_STOCK_ITEM_COUNT: u64 = 2;

/// Activity logs written today (2 vitals, 1 food)
pub const TODAY_ACTIVITY_LOGS: u64 = 3;

/// Tasks completed today
pub const TODAY_COMPLETED_TASKS: u64 = 1;

/// Tasks still pending
pub const PENDING_TASKS: u64 = 2;

/// Residents in the facility
pub const RESIDENT_COUNT: u64 = 2;

/// Staff members still checked in today ("Nurse Joy")
pub const OPEN_SHIFT_STAFF: &str = "Nurse Joy";

/// Resident whose latest family message has gone unanswered ("Alice Rossi")
pub const UNANSWERED_RESIDENT: &str = "Alice Rossi";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Per-request timeout of the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
