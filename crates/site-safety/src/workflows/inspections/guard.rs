use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::{InspectionId, TenantId};

type ClaimKey = (TenantId, InspectionId);

/// In-process claims on inspections with a Final submission in flight.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard {
    claims: Arc<Mutex<HashSet<ClaimKey>>>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` while another submission holds the inspection.
    pub fn try_claim(&self, tenant: TenantId, inspection: InspectionId) -> Option<SubmissionClaim> {
        let key = (tenant, inspection);
        let inserted = self
            .claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        inserted.then(|| SubmissionClaim {
            claims: Arc::clone(&self.claims),
            key,
        })
    }

    pub fn is_claimed(&self, tenant: TenantId, inspection: InspectionId) -> bool {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(tenant, inspection))
    }
}

/// Released on drop.
#[derive(Debug)]
pub struct SubmissionClaim {
    claims: Arc<Mutex<HashSet<ClaimKey>>>,
    key: ClaimKey,
}

impl Drop for SubmissionClaim {
    fn drop(&mut self) {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
