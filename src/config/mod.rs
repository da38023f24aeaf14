//! Per-node configuration.
//!
//! A [`Config`] packs boolean options into [`ConfigFlags`], keeps everything
//! else in a typed settings map, and carries the node's stage hooks. Keys are
//! validated against the [`Registry`](crate::registry::Registry) schema: a
//! type-mismatched or unknown access yields the zero value for the requested
//! type, never a reinterpreted one.
//!
//! Containers resolve their *effective* config before visiting children: a
//! config supplied by the parent run always wins over the node's own. This is
//! how a session injects a uniform policy (say, abort-on-failure) across an
//! entire tree regardless of what each node declared for itself.

use std::{borrow::Cow, collections::HashMap};

mod flags;
pub use flags::ConfigFlags;
pub(crate) use flags::bits;

mod value;
pub use value::*;

use crate::{
    registry::{ContextKind, Registry},
    stage::{HookHandle, Stage, StageHook, StageHooks},
};

#[derive(Debug, Default)]
pub struct Config {
    flags: ConfigFlags,
    settings: HashMap<Cow<'static, str>, Value>,
    hooks: StageHooks,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// The config to use at a node: the parent-supplied run config when
    /// present, the node's own otherwise.
    pub fn effective<'c>(
        run_config: Option<&'c Config>,
        own: Option<&'c Config>,
    ) -> Option<&'c Config> {
        let effective = run_config.or(own);
        tracing::trace!(
            overridden = run_config.is_some() && own.is_some(),
            "resolved effective config"
        );
        effective
    }

    pub fn flags(&self) -> &ConfigFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut ConfigFlags {
        &mut self.flags
    }

    /// True when nothing has been configured. An empty config is not worth
    /// passing down as a run config.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.settings.is_empty() && self.hooks.is_empty()
    }

    /// Set a key to a value, validated against the schema.
    ///
    /// Returns false (and changes nothing) for unknown keys and for values
    /// whose type does not match the declared one. `Bool` keys land in the
    /// packed flags; everything else in the settings map under the key's
    /// canonical name.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let Some(row) = Registry::global().find(key) else {
            return false;
        };
        if row.value_type != value.value_type() {
            return false;
        }
        match (row.flag, &value) {
            (bit, Value::Bool(on)) if bit != 0 => self.flags.set_raw(bit, *on),
            _ => {
                self.settings.insert(Cow::Borrowed(row.key), value);
            }
        }
        true
    }

    /// Builder form of [`set`](Self::set); invalid keys are dropped silently.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get_bool(&self, key: &str) -> bool {
        let Some(row) = Registry::global().find(key) else {
            return false;
        };
        if row.value_type != ValueType::Bool {
            return false;
        }
        if row.flag != 0 {
            return self.flags.get_raw(row.flag);
        }
        match self.settings.get(row.key) {
            Some(Value::Bool(on)) => *on,
            Some(_) => false,
            None => matches!(row.default, Value::Bool(true)),
        }
    }

    pub fn get_usize(&self, key: &str) -> usize {
        match self.lookup(key, ValueType::Usize) {
            Some(Value::Usize(value)) => *value,
            _ => 0,
        }
    }

    pub fn get_i32(&self, key: &str) -> i32 {
        match self.lookup(key, ValueType::I32) {
            Some(Value::I32(value)) => *value,
            _ => 0,
        }
    }

    pub fn get_u32(&self, key: &str) -> u32 {
        match self.lookup(key, ValueType::U32) {
            Some(Value::U32(value)) => *value,
            _ => 0,
        }
    }

    pub fn get_str(&self, key: &str) -> &str {
        match self.lookup(key, ValueType::Str) {
            Some(Value::Str(value)) => value.as_ref(),
            _ => "",
        }
    }

    /// Stored value or registry default, only when the declared type matches
    /// the requested one.
    fn lookup(&self, key: &str, requested: ValueType) -> Option<&Value> {
        let row = Registry::global().find(key)?;
        if row.value_type != requested {
            return None;
        }
        self.settings.get(row.key).or(Some(&row.default))
    }

    /// Attach a hook for a stage, replacing any previous one.
    pub fn set_hook(&mut self, stage: Stage, hook: impl Into<HookHandle>) {
        self.hooks.set(stage, hook.into());
    }

    pub fn with_hook<H>(mut self, stage: Stage, hook: H) -> Self
    where
        H: StageHook + Send + Sync + 'static,
    {
        self.set_hook(stage, HookHandle::from_boxed(hook));
        self
    }

    pub fn hook(&self, stage: Stage) -> Option<&HookHandle> {
        self.hooks.get(stage)
    }

    /// Filter an argument list down to the keys legal at `context`, with
    /// matching declared types. Unknown and out-of-context keys are dropped
    /// silently; they may be meant for a different level.
    pub fn validate_args<I>(args: I, context: ContextKind) -> Vec<(Cow<'static, str>, Value)>
    where
        I: IntoIterator<Item = (Cow<'static, str>, Value)>,
    {
        let registry = Registry::global();
        args.into_iter()
            .filter(|(key, value)| {
                registry
                    .find(key)
                    .map(|row| {
                        row.contexts.contains(context) && row.value_type == value.value_type()
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Apply a pre-validated argument list.
    pub fn apply_args<I>(&mut self, args: I, context: ContextKind)
    where
        I: IntoIterator<Item = (Cow<'static, str>, Value)>,
    {
        for (key, value) in Self::validate_args(args, context) {
            self.set(key.as_ref(), value);
        }
    }
}
