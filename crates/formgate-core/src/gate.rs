#![forbid(unsafe_code)]

//! The apply gate and the scoped busy flag.

use std::fmt;
use std::rc::Rc;

use formgate_runtime::{BindingScope, Observable};

/// `valid AND dirty AND NOT busy`.
#[must_use]
pub const fn apply_gate(valid: bool, dirty: bool, busy: bool) -> bool {
    valid && dirty && !busy
}

/// Push-derived "can apply" signal.
///
/// Recomputed on every change of any input; there is no polling.
pub struct ApplyGate {
    can_apply: Observable<bool>,
    _inputs: BindingScope,
}

impl ApplyGate {
    #[must_use]
    pub fn new(valid: &Observable<bool>, dirty: &Observable<bool>, busy: &Observable<bool>) -> Self {
        let can_apply = Observable::new(apply_gate(valid.get(), dirty.get(), busy.get()));
        let recompute: Rc<dyn Fn()> = {
            let (valid, dirty, busy) = (valid.clone(), dirty.clone(), busy.clone());
            let out = can_apply.clone();
            Rc::new(move || out.set(apply_gate(valid.get(), dirty.get(), busy.get())))
        };

        let mut inputs = BindingScope::new();
        for input in [valid, dirty, busy] {
            let recompute = Rc::clone(&recompute);
            inputs.subscribe(input, move |_| recompute());
        }
        Self {
            can_apply,
            _inputs: inputs,
        }
    }

    #[must_use]
    pub fn can_apply(&self) -> bool {
        self.can_apply.get()
    }

    #[must_use]
    pub fn signal(&self) -> &Observable<bool> {
        &self.can_apply
    }
}

impl fmt::Debug for ApplyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyGate")
            .field("can_apply", &self.can_apply.get())
            .finish()
    }
}

/// Holds a busy flag set for its lifetime.
///
/// Dropping the guard clears the flag on every exit path, including early
/// returns through `?` and unwinding.
#[must_use = "dropping the guard clears the busy flag immediately"]
pub struct BusyGuard {
    busy: Observable<bool>,
    armed: bool,
}

impl BusyGuard {
    pub fn acquire(busy: &Observable<bool>) -> Self {
        busy.set(true);
        Self {
            busy: busy.clone(),
            armed: true,
        }
    }

    /// Release the guard without clearing the flag.
    pub fn hold(mut self) {
        self.armed = false;
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.armed {
            self.busy.set(false);
        }
    }
}

impl fmt::Debug for BusyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusyGuard").field("armed", &self.armed).finish()
    }
}
