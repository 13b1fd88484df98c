//! Disposers - Per-object release callbacks.
//!
//! Every acquisition made while attaching (a loader subscription, for
//! instance) pushes the closure that releases it. Detaching runs all of
//! them exactly once, newest first, whatever triggered the detach.

use tracing::warn;

use crate::error::{NativeError, NativeResult};

/// Releases one engine-side acquisition.
pub type Disposer<E> = Box<dyn FnOnce(&mut E) -> NativeResult<()>>;

/// Ordered disposer list of one live object.
pub struct Disposers<E> {
    pending: Vec<Disposer<E>>,
}

impl<E> Default for Disposers<E> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

impl<E> Disposers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, disposer: impl FnOnce(&mut E) -> NativeResult<()> + 'static) {
        self.pending.push(Box::new(disposer));
    }

    /// Disposers not yet run.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every pending disposer in reverse registration order.
    ///
    /// A failing disposer does not stop the rest; the first error is
    /// returned once all have run.
    pub fn run_all(&mut self, engine: &mut E) -> NativeResult<()> {
        let mut first_error: Option<NativeError> = None;
        while let Some(disposer) = self.pending.pop() {
            if let Err(error) = disposer(engine) {
                warn!(%error, "disposer failed");
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_all_reverse_order() {
        let mut disposers: Disposers<Vec<u32>> = Disposers::new();
        disposers.push(|log: &mut Vec<u32>| {
            log.push(1);
            Ok(())
        });
        disposers.push(|log: &mut Vec<u32>| {
            log.push(2);
            Ok(())
        });

        let mut log = Vec::new();
        disposers.run_all(&mut log).unwrap();
        assert_eq!(log, vec![2, 1]);
        assert!(disposers.is_empty());
    }

    #[test]
    fn test_failure_does_not_stop_the_rest() {
        let mut disposers: Disposers<Vec<u32>> = Disposers::new();
        disposers.push(|log: &mut Vec<u32>| {
            log.push(1);
            Ok(())
        });
        disposers.push(|_: &mut Vec<u32>| Err(NativeError::Other("second".to_string())));
        disposers.push(|_: &mut Vec<u32>| Err(NativeError::Other("third".to_string())));

        let mut log = Vec::new();
        let result = disposers.run_all(&mut log);

        // Newest runs first, so its error is the one reported.
        assert_eq!(result, Err(NativeError::Other("third".to_string())));
        assert_eq!(log, vec![1]);

        // Exactly once: a second run has nothing left.
        assert!(disposers.run_all(&mut log).is_ok());
        assert_eq!(log, vec![1]);
    }
}
