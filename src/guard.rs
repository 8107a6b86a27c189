//! Catches a hash or equality policy calling back into its own table.
//!
//! Keyed operations hold bucket indices and chain positions across policy
//! calls: `remove` finds a position and then unlinks it, `rehash` keeps
//! borrowed keys in its placement plan until every entry has a target. A
//! policy that reaches the table through a shared pointer or a `RefCell`
//! and inserts or removes in the middle of that would invalidate what the
//! outer operation has already computed.
//!
//! Debug builds record which operation is open and panic, naming it, on a
//! nested entry. Release builds keep only the `!Sync` marker.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table record of the operation currently running policies.
#[derive(Debug)]
pub(crate) struct PolicyGuard {
    #[cfg(debug_assertions)]
    open: Cell<Option<&'static str>>,
    // Keeps the owning table !Sync in every build profile.
    _unsync: PhantomData<Cell<()>>,
}

impl PolicyGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            open: Cell::new(None),
            _unsync: PhantomData,
        }
    }

    /// Open the section in which operation `op` calls policies.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.open.replace(Some(op)) {
                self.open.set(Some(outer));
                panic!("hash table `{op}` called from a policy while `{outer}` was running");
            }
            return Section { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return Section { _z: PhantomData };
        }
    }
}

/// Closes the section on drop, unwinding included.
pub(crate) struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a PolicyGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.open.set(None);
    }
}
