use std::io;
use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use crate::io::Endpoint;
use crate::protocol::Timeout;

/// Overrides the read timeout of an endpoint for as long as the guard lives.
///
/// The previous timeout is put back on drop, whichever way the scope is left.
/// Installing fails when the current timeout can't be queried or the new one
/// can't be set; the endpoint's timeout is then left as it was.
pub(crate) struct TimeoutGuard<'a, E: Endpoint + ?Sized> {
    endpoint: &'a mut E,
    original: Timeout,
}

impl<'a, E: Endpoint + ?Sized> TimeoutGuard<'a, E> {
    pub(crate) fn install(endpoint: &'a mut E, timeout: Timeout) -> io::Result<Self> {
        let original = endpoint.so_timeout()?;
        endpoint.set_so_timeout(timeout)?;
        trace!(%original, %timeout, "installed temporary socket timeout");
        Ok(Self { endpoint, original })
    }
}

impl<E: Endpoint + ?Sized> Deref for TimeoutGuard<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.endpoint
    }
}

impl<E: Endpoint + ?Sized> DerefMut for TimeoutGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.endpoint
    }
}

impl<E: Endpoint + ?Sized> Drop for TimeoutGuard<'_, E> {
    fn drop(&mut self) {
        if let Err(e) = self.endpoint.set_so_timeout(self.original) {
            debug!(cause = %e, timeout = %self.original, "can't restore socket timeout");
        }
    }
}
