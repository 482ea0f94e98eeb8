//! Test doubles shared by the permission module tests

use std::collections::{BTreeSet, VecDeque};

use parking_lot::Mutex;

use super::ids::GroupIdSource;
use super::member::{PrincipalId, SecurityContext, SecurityLevel};

/// Hands out scripted ids in order, then falls back to `id-<n>`
#[derive(Debug, Default)]
pub(crate) struct SequenceIds {
    queue: Mutex<VecDeque<String>>,
    issued: Mutex<usize>,
}

impl SequenceIds {
    pub(crate) fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(ids.into_iter().map(Into::into).collect()),
            issued: Mutex::new(0),
        }
    }
}

impl GroupIdSource for SequenceIds {
    fn next_id(&self) -> String {
        let mut issued = self.issued.lock();
        *issued += 1;
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("id-{}", *issued))
    }
}

/// Security context with configurable developers and contributors
#[derive(Debug, Default)]
pub(crate) struct TestSecurity {
    pub(crate) developers: BTreeSet<PrincipalId>,
    pub(crate) contributors: BTreeSet<PrincipalId>,
    pub(crate) development: bool,
}

impl SecurityContext for TestSecurity {
    fn is_authorised(&self, principal: PrincipalId, level: SecurityLevel) -> bool {
        match level {
            SecurityLevel::Developer => self.developers.contains(&principal),
            SecurityLevel::Contributor => self.contributors.contains(&principal),
        }
    }

    fn is_development(&self) -> bool {
        self.development
    }
}
