use std::path::PathBuf;

/// What happens to the persisted schedule table when a workspace is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStartup {
    /// Keep existing entries and add any missing columns.
    Migrate,
    /// Drop and recreate the table, discarding every persisted entry.
    Recreate,
}

/// How a classroom that fails the pattern check is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassroomPolicy {
    Reject,
    Warn,
}

/// How the grid reconciler reacts to a row that fails to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    ContinueOnError,
    Strict,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub schedule_startup: ScheduleStartup,
    pub classroom_policy: ClassroomPolicy,
    pub failure_policy: FailurePolicy,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            schedule_startup: ScheduleStartup::Migrate,
            classroom_policy: ClassroomPolicy::Reject,
            failure_policy: FailurePolicy::ContinueOnError,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let workspace = get("ROSTERD_WORKSPACE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let schedule_startup = match get("ROSTERD_SCHEDULE_ON_START").as_deref() {
            None => defaults.schedule_startup,
            Some(v) => ScheduleStartup::parse(v).unwrap_or_else(|| {
                tracing::warn!(value = v, "unknown ROSTERD_SCHEDULE_ON_START, using migrate");
                defaults.schedule_startup
            }),
        };

        let classroom_policy = match get("ROSTERD_CLASSROOM_POLICY").as_deref() {
            None => defaults.classroom_policy,
            Some(v) => ClassroomPolicy::parse(v).unwrap_or_else(|| {
                tracing::warn!(value = v, "unknown ROSTERD_CLASSROOM_POLICY, using reject");
                defaults.classroom_policy
            }),
        };

        let failure_policy = match get("ROSTERD_RECONCILE_POLICY").as_deref() {
            None => defaults.failure_policy,
            Some(v) => FailurePolicy::parse(v).unwrap_or_else(|| {
                tracing::warn!(value = v, "unknown ROSTERD_RECONCILE_POLICY, using continue");
                defaults.failure_policy
            }),
        };

        let seed = get("ROSTERD_SEED").and_then(|v| match v.trim().parse::<u64>() {
            Ok(s) => Some(s),
            Err(_) => {
                tracing::warn!(value = %v, "ROSTERD_SEED is not an unsigned integer, ignoring");
                None
            }
        });

        Self {
            workspace,
            schedule_startup,
            classroom_policy,
            failure_policy,
            seed,
        }
    }
}

impl ScheduleStartup {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "migrate" => Some(Self::Migrate),
            "recreate" => Some(Self::Recreate),
            _ => None,
        }
    }
}

impl ClassroomPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "warn" => Some(Self::Warn),
            _ => None,
        }
    }
}

impl FailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Some(Self::ContinueOnError),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}
