use heapless::Vec;

use crate::config::WRITE_PAYLOAD_MAX;
use crate::{Error, Uuid};

/// A write awaiting its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingWrite {
    pub(crate) uuid: Uuid,
    pub(crate) handle: u16,
    pub(crate) data: Vec<u8, WRITE_PAYLOAD_MAX>,
}

/// At most one write in flight.
pub(crate) struct WriteGuard {
    pending: Option<PendingWrite>,
}

impl WriteGuard {
    pub(crate) const fn new() -> Self {
        Self { pending: None }
    }

    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.pending.is_some() {
            return Err(Error::WriteAlreadyPending);
        }
        Ok(())
    }

    /// Claim the guard, copying `payload`.
    pub(crate) fn begin(&mut self, uuid: Uuid, handle: u16, payload: &[u8]) -> Result<&PendingWrite, Error> {
        self.check()?;
        let data = Vec::from_slice(payload).map_err(|_| Error::PayloadTooLarge)?;
        Ok(self.pending.insert(PendingWrite { uuid, handle, data }))
    }

    /// Release the guard, returning the finished write.
    pub(crate) fn complete(&mut self) -> Option<PendingWrite> {
        self.pending.take()
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
