//! Sequential partner identifier allocation
//!
//! Identifiers are handed out in ascending order inside a closed range per
//! tenant. The next value is `max + 1` over the identifiers already used in the
//! range, or the range start when none are.
//!
//! Reading the maximum and inserting the new row are two statements, so the
//! allocator always runs inside the caller's transaction after the tenant lock
//! has been taken (see [`crate::service::PartnerService`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use core_kernel::{ClientId, CoreError, PartnerId};

use crate::ports::{PartnerTransaction, StorageError};

/// Closed range of assignable partner identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    start: i32,
    end: i32,
}

impl IdRange {
    /// Range used when none is configured
    pub const DEFAULT: IdRange = IdRange { start: 1000, end: 5000 };

    /// Creates a range, rejecting an empty or non-positive one
    pub fn new(start: i32, end: i32) -> Result<Self, CoreError> {
        if start <= 0 || end < start {
            return Err(CoreError::validation(format!(
                "invalid partner id range {}-{}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, id: PartnerId) -> bool {
        (self.start..=self.end).contains(&id.value())
    }
}

impl Default for IdRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Errors raised while allocating an identifier
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Identifier range {range} is exhausted")]
    Exhausted { range: IdRange },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Computes the next free identifier in a range
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialIdAllocator {
    range: IdRange,
}

impl SequentialIdAllocator {
    pub fn new(range: IdRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> IdRange {
        self.range
    }

    /// Next identifier given the largest one already in use
    ///
    /// An unused range starts at its lower bound, never at `1`.
    pub fn next_after(&self, max_in_use: Option<PartnerId>) -> Result<PartnerId, AllocationError> {
        let Some(max) = max_in_use else {
            return Ok(PartnerId::new(self.range.start));
        };

        if max.value() < self.range.start {
            return Ok(PartnerId::new(self.range.start));
        }

        match max.value().checked_add(1) {
            Some(next) if next <= self.range.end => Ok(PartnerId::new(next)),
            _ => Err(AllocationError::Exhausted { range: self.range }),
        }
    }

    /// Queries current usage through `tx` and returns the next identifier
    pub async fn allocate<T>(&self, tx: &mut T, client: ClientId) -> Result<PartnerId, AllocationError>
    where
        T: PartnerTransaction + ?Sized,
    {
        let max_in_use = tx.query_max_id(client, self.range).await?;
        let next = self.next_after(max_in_use)?;

        debug!(
            client_id = client.value(),
            max_in_use = ?max_in_use.map(|id| id.value()),
            next = next.value(),
            "Allocated partner identifier"
        );

        Ok(next)
    }
}
