//! Hook sets and the dispatch strategy they select

use realmgate_sdk::{Exception, HostResult, HostRuntime, HostValue, ObjectHandle, RealmId};

/// Trampoline dispatch tier, chosen once when the function is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// No hooks: call the implementation directly
    Direct,
    /// `before` and/or `after` only; exceptions pass through
    BeforeAfter,
    /// `catch` and/or `finally` present; recoverable exceptions are intercepted
    CatchFinally,
}

impl Strategy {
    /// Get the strategy name
    pub const fn name(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::BeforeAfter => "before-after",
            Strategy::CatchFinally => "catch-finally",
        }
    }
}

/// Hook callables, in call order per stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    /// `before(context, platform)`
    pub before: Vec<ObjectHandle>,
    /// `after(result, context, platform) -> result`
    pub after: Vec<ObjectHandle>,
    /// `catch(exception, context, platform) -> result`
    pub catch: Vec<ObjectHandle>,
    /// `finally(context, platform)`
    pub finally: Vec<ObjectHandle>,
}

impl HookSet {
    /// Create an empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `before` hook
    pub fn with_before(mut self, hook: ObjectHandle) -> Self {
        self.before.push(hook);
        self
    }

    /// Append an `after` hook
    pub fn with_after(mut self, hook: ObjectHandle) -> Self {
        self.after.push(hook);
        self
    }

    /// Append a `catch` hook
    pub fn with_catch(mut self, hook: ObjectHandle) -> Self {
        self.catch.push(hook);
        self
    }

    /// Append a `finally` hook
    pub fn with_finally(mut self, hook: ObjectHandle) -> Self {
        self.finally.push(hook);
        self
    }

    /// Check if no hook is configured
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty() && self.catch.is_empty() && self.finally.is_empty()
    }

    /// Pick the dispatch tier for this hook set
    pub fn strategy(&self) -> Strategy {
        if !self.catch.is_empty() || !self.finally.is_empty() {
            Strategy::CatchFinally
        } else if !self.before.is_empty() || !self.after.is_empty() {
            Strategy::BeforeAfter
        } else {
            Strategy::Direct
        }
    }

    /// Iterate over every hook in the set
    pub fn iter(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.before
            .iter()
            .chain(&self.after)
            .chain(&self.catch)
            .chain(&self.finally)
            .copied()
    }

    pub(crate) fn run_before(
        &self,
        host: &dyn HostRuntime,
        realm: RealmId,
        context: &HostValue,
        platform: &HostValue,
    ) -> HostResult<()> {
        for hook in &self.before {
            host.call(realm, *hook, HostValue::Undefined, &[context.clone(), platform.clone()])?;
        }
        Ok(())
    }

    pub(crate) fn run_after(
        &self,
        host: &dyn HostRuntime,
        realm: RealmId,
        result: HostValue,
        context: &HostValue,
        platform: &HostValue,
    ) -> HostResult<HostValue> {
        self.after.iter().try_fold(result, |result, hook| {
            host.call(realm, *hook, HostValue::Undefined, &[result, context.clone(), platform.clone()])
        })
    }

    /// Offer `exception` to each `catch` hook in turn.
    ///
    /// The first hook that returns handles it. A hook that throws replaces the
    /// exception seen by the next one; the last thrown value is re-raised.
    pub(crate) fn run_catch(
        &self,
        host: &dyn HostRuntime,
        realm: RealmId,
        exception: HostValue,
        context: &HostValue,
        platform: &HostValue,
    ) -> HostResult<HostValue> {
        let mut current = exception;
        for hook in &self.catch {
            let args = [current, context.clone(), platform.clone()];
            match host.call(realm, *hook, HostValue::Undefined, &args) {
                Ok(value) => return Ok(value),
                Err(Exception::Thrown(replacement)) => current = replacement,
                Err(signal) => return Err(signal),
            }
        }
        Err(Exception::Thrown(current))
    }

    pub(crate) fn run_finally(
        &self,
        host: &dyn HostRuntime,
        realm: RealmId,
        context: &HostValue,
        platform: &HostValue,
    ) -> HostResult<()> {
        for hook in &self.finally {
            host.call(realm, *hook, HostValue::Undefined, &[context.clone(), platform.clone()])?;
        }
        Ok(())
    }
}
