//! One-shot deferred results.
//!
//! Data sources return a [`Remote`] for every fetch or save they begin. The
//! paired [`Resolver`] is held by the transport and settled exactly once,
//! after which the next [`Tree::poll`](crate::Tree::poll) sweep observes the
//! outcome and completes the pending operation.

use std::{cell::RefCell, rc::Rc};

use thiserror::Error;

/// Error produced by a failed remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// Failure message.
    message: String,
}

impl RemoteError {
    /// Construct a remote error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

enum State<T> {
    Pending,
    Ready(Result<T, RemoteError>),
    Taken,
}

/// The receiving half of a one-shot deferred result.
#[derive(Clone)]
pub struct Remote<T> {
    state: Rc<RefCell<State<T>>>,
}

impl<T> std::fmt::Debug for Remote<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match &*self.state.borrow() {
            State::Pending => "Pending",
            State::Ready(_) => "Ready",
            State::Taken => "Taken",
        };
        f.debug_struct("Remote").field("state", &s).finish()
    }
}

impl<T> Remote<T> {
    /// Create an unsettled remote along with the resolver that settles it.
    pub fn pending() -> (Remote<T>, Resolver<T>) {
        let state = Rc::new(RefCell::new(State::Pending));
        (
            Remote {
                state: state.clone(),
            },
            Resolver { state },
        )
    }

    /// Create a remote that is already resolved with a value.
    pub fn ready(value: T) -> Remote<T> {
        Remote {
            state: Rc::new(RefCell::new(State::Ready(Ok(value)))),
        }
    }

    /// Create a remote that is already failed.
    pub fn failed(err: RemoteError) -> Remote<T> {
        Remote {
            state: Rc::new(RefCell::new(State::Ready(Err(err)))),
        }
    }

    /// True while the remote has not been settled.
    pub fn is_pending(&self) -> bool {
        matches!(&*self.state.borrow(), State::Pending)
    }

    /// Take the settled outcome, if there is one. Returns None while pending
    /// or after the outcome has already been taken.
    pub(crate) fn take(&self) -> Option<Result<T, RemoteError>> {
        let mut state = self.state.borrow_mut();
        match &*state {
            State::Ready(_) => {
                let prev = std::mem::replace(&mut *state, State::Taken);
                match prev {
                    State::Ready(outcome) => Some(outcome),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// The settling half of a one-shot deferred result.
pub struct Resolver<T> {
    state: Rc<RefCell<State<T>>>,
}

impl<T> Resolver<T> {
    /// Settle the remote with a value.
    pub fn resolve(self, value: T) {
        let mut state = self.state.borrow_mut();
        if matches!(&*state, State::Pending) {
            *state = State::Ready(Ok(value));
        }
    }

    /// Settle the remote with a failure.
    pub fn fail(self, err: RemoteError) {
        let mut state = self.state.borrow_mut();
        if matches!(&*state, State::Pending) {
            *state = State::Ready(Err(err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_lifecycle() {
        let (remote, resolver) = Remote::pending();
        assert!(remote.is_pending());
        assert!(remote.take().is_none());
        resolver.resolve(7);
        assert!(!remote.is_pending());
        assert_eq!(remote.take(), Some(Ok(7)));
        assert!(remote.take().is_none());
    }

    #[test]
    fn remote_failure() {
        let (remote, resolver) = Remote::<i64>::pending();
        resolver.fail(RemoteError::new("offline"));
        assert_eq!(remote.take(), Some(Err(RemoteError::new("offline"))));
    }

    #[test]
    fn remote_ready() {
        let remote = Remote::ready("x");
        assert!(!remote.is_pending());
        assert_eq!(remote.take(), Some(Ok("x")));
    }
}
