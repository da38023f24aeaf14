//! Option schema for canopy.
//!
//! Every key the engine or a reporter understands is declared here as a
//! [`SettingRow`]: its canonical name, aliases, the [`ConfigFlags`] bit it
//! drives (for `Bool` keys), its value type, and the tree levels it is legal
//! on. Config accessors and [`validate_args`](crate::config::Config::validate_args)
//! consult this schema; keys it does not know are ignored, not errors.
//!
//! The schema is process-wide and built once behind a [`LazyLock`], so
//! concurrent first use is safe.

use std::{collections::HashMap, sync::LazyLock};

use crate::config::{Value, ValueType, bits};

/// Canonical key names, as accepted by [`Config::set`](crate::config::Config::set).
pub mod keys {
    pub const SHOW_MESSAGES: &str = "show_messages";
    pub const SHOW_COUNTS: &str = "show_counts";
    pub const PRINT_ON_PASS: &str = "print_on_pass";
    pub const PRINT_ON_FAIL: &str = "print_on_fail";
    pub const COLOR: &str = "color";
    pub const SHOW_TIMESTAMPS: &str = "show_timestamps";
    pub const SHOW_DURATION: &str = "show_duration";

    pub const ABORT_ON_FAILURE: &str = "abort_on_failure";
    pub const DISABLED: &str = "disabled";
    pub const FAIL_FAST: &str = "fail_fast";
    pub const REPEAT_COUNT: &str = "repeat_count";

    pub const VERBOSITY: &str = "verbosity";
    pub const OUTPUT_FORMAT: &str = "output_format";
    pub const OUTPUT_FILE: &str = "output_file";

    // Reserved keys: declared so they validate and round-trip, but the run
    // loop never consults them.
    pub const TIMEOUT_MS: &str = "timeout_ms";
    pub const SHUFFLE: &str = "shuffle";
    pub const SHUFFLE_SEED: &str = "shuffle_seed";
    pub const PARALLEL: &str = "parallel";
    pub const PARALLEL_WORKERS: &str = "parallel_workers";
    pub const FILTER_INCLUDE: &str = "filter_include";
    pub const FILTER_EXCLUDE: &str = "filter_exclude";
    pub const FILTER_TAGS: &str = "filter_tags";
}

/// A tree level a key may be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Session,
    Module,
    Block,
    Test,
}

/// Set of [`ContextKind`]s a key is legal on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSet(u8);

impl ContextSet {
    pub const SESSION: Self = Self(1 << 0);
    pub const MODULE: Self = Self(1 << 1);
    pub const BLOCK: Self = Self(1 << 2);
    pub const TEST: Self = Self(1 << 3);
    pub const ALL: Self = Self(0b1111);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, kind: ContextKind) -> bool {
        let bit = match kind {
            ContextKind::Session => Self::SESSION.0,
            ContextKind::Module => Self::MODULE.0,
            ContextKind::Block => Self::BLOCK.0,
            ContextKind::Test => Self::TEST.0,
        };
        self.0 & bit != 0
    }
}

/// Schema row for one option key.
#[derive(Debug)]
pub struct SettingRow {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
    /// Bit in [`ConfigFlags`](crate::config::ConfigFlags) this key drives,
    /// or 0 when the value lives in the settings map.
    pub flag: u32,
    pub value_type: ValueType,
    pub contexts: ContextSet,
    pub default: Value,
}

const CONTAINERS: ContextSet = ContextSet::MODULE
    .union(ContextSet::BLOCK)
    .union(ContextSet::TEST);

static ROWS: &[SettingRow] = &[
    SettingRow {
        key: keys::SHOW_MESSAGES,
        aliases: &["messages"],
        flag: bits::SHOW_MESSAGES,
        value_type: ValueType::Bool,
        contexts: ContextSet::ALL,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::SHOW_COUNTS,
        aliases: &["counts"],
        flag: bits::SHOW_COUNTS,
        value_type: ValueType::Bool,
        contexts: ContextSet::ALL,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::PRINT_ON_PASS,
        aliases: &[],
        flag: bits::PRINT_ON_PASS,
        value_type: ValueType::Bool,
        contexts: ContextSet::ALL,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::PRINT_ON_FAIL,
        aliases: &[],
        flag: bits::PRINT_ON_FAIL,
        value_type: ValueType::Bool,
        contexts: ContextSet::ALL,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::COLOR,
        aliases: &["colour"],
        flag: bits::COLOR,
        value_type: ValueType::Bool,
        contexts: ContextSet::SESSION,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::SHOW_TIMESTAMPS,
        aliases: &["timestamps"],
        flag: bits::SHOW_TIMESTAMPS,
        value_type: ValueType::Bool,
        contexts: ContextSet::SESSION,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::SHOW_DURATION,
        aliases: &["duration"],
        flag: bits::SHOW_DURATION,
        value_type: ValueType::Bool,
        contexts: ContextSet::SESSION,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::ABORT_ON_FAILURE,
        aliases: &["abort"],
        flag: bits::ABORT_ON_FAILURE,
        value_type: ValueType::Bool,
        contexts: ContextSet::ALL,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::DISABLED,
        aliases: &[],
        flag: bits::DISABLED,
        value_type: ValueType::Bool,
        contexts: CONTAINERS,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::FAIL_FAST,
        aliases: &[],
        flag: 0,
        value_type: ValueType::Usize,
        contexts: ContextSet::SESSION,
        default: Value::Usize(0),
    },
    SettingRow {
        key: keys::REPEAT_COUNT,
        aliases: &["repeat"],
        flag: 0,
        value_type: ValueType::Usize,
        contexts: ContextSet::SESSION,
        default: Value::Usize(1),
    },
    SettingRow {
        key: keys::VERBOSITY,
        aliases: &[],
        flag: 0,
        value_type: ValueType::U32,
        contexts: ContextSet::SESSION,
        default: Value::U32(2),
    },
    SettingRow {
        key: keys::OUTPUT_FORMAT,
        aliases: &["format"],
        flag: 0,
        value_type: ValueType::Str,
        contexts: ContextSet::SESSION,
        default: Value::Str(std::borrow::Cow::Borrowed("console")),
    },
    SettingRow {
        key: keys::OUTPUT_FILE,
        aliases: &["output"],
        flag: 0,
        value_type: ValueType::Str,
        contexts: ContextSet::SESSION,
        default: Value::Str(std::borrow::Cow::Borrowed("")),
    },
    SettingRow {
        key: keys::TIMEOUT_MS,
        aliases: &["timeout"],
        flag: 0,
        value_type: ValueType::Usize,
        contexts: ContextSet::ALL,
        default: Value::Usize(0),
    },
    SettingRow {
        key: keys::SHUFFLE,
        aliases: &[],
        flag: bits::SHUFFLE,
        value_type: ValueType::Bool,
        contexts: ContextSet::SESSION,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::SHUFFLE_SEED,
        aliases: &[],
        flag: 0,
        value_type: ValueType::U32,
        contexts: ContextSet::SESSION,
        default: Value::U32(0),
    },
    SettingRow {
        key: keys::PARALLEL,
        aliases: &[],
        flag: bits::PARALLEL,
        value_type: ValueType::Bool,
        contexts: ContextSet::SESSION,
        default: Value::Bool(false),
    },
    SettingRow {
        key: keys::PARALLEL_WORKERS,
        aliases: &["workers"],
        flag: 0,
        value_type: ValueType::Usize,
        contexts: ContextSet::SESSION,
        default: Value::Usize(0),
    },
    SettingRow {
        key: keys::FILTER_INCLUDE,
        aliases: &["include"],
        flag: 0,
        value_type: ValueType::Str,
        contexts: ContextSet::SESSION,
        default: Value::Str(std::borrow::Cow::Borrowed("")),
    },
    SettingRow {
        key: keys::FILTER_EXCLUDE,
        aliases: &["exclude"],
        flag: 0,
        value_type: ValueType::Str,
        contexts: ContextSet::SESSION,
        default: Value::Str(std::borrow::Cow::Borrowed("")),
    },
    SettingRow {
        key: keys::FILTER_TAGS,
        aliases: &["tags"],
        flag: 0,
        value_type: ValueType::Str,
        contexts: ContextSet::SESSION,
        default: Value::Str(std::borrow::Cow::Borrowed("")),
    },
];

/// The option schema: key → row lookup, including aliases.
pub struct Registry {
    rows: &'static [SettingRow],
    index: HashMap<&'static str, usize>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::load);

impl Registry {
    fn load() -> Self {
        let mut index = HashMap::new();
        for (at, row) in ROWS.iter().enumerate() {
            index.insert(row.key, at);
            for alias in row.aliases {
                index.insert(*alias, at);
            }
        }
        Self { rows: ROWS, index }
    }

    /// The process-wide schema instance.
    pub fn global() -> &'static Registry {
        &REGISTRY
    }

    /// Look a key (or alias) up.
    pub fn find(&self, key: &str) -> Option<&SettingRow> {
        self.index.get(key).map(|at| &self.rows[*at])
    }

    /// Whether `key` is known and legal at the given tree level.
    pub fn is_valid_arg(&self, key: &str, context: ContextKind) -> bool {
        self.find(key)
            .map(|row| row.contexts.contains(context))
            .unwrap_or(false)
    }

    pub fn rows(&self) -> impl Iterator<Item = &SettingRow> {
        self.rows.iter()
    }
}
