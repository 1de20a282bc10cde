//! Data model change observers.
//!
//! # Responsibility
//! - Keep registered observers in registration order.
//! - Fan out change notifications synchronously.
//!
//! # Invariants
//! - Notification order equals registration order.
//! - A panicking observer is logged and skipped; later observers still run.
//! - Ids are never reused within one list.

use log::error;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Receives a callback after the controller swaps in a newly loaded model.
pub trait DataModelObserver {
    fn data_model_changed(&self);
}

/// Handle returned by registration, used to unregister later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl Display for ObserverId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

#[derive(Default)]
pub struct ObserverList {
    next_id: u64,
    entries: Vec<(ObserverId, Arc<dyn DataModelObserver>)>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn DataModelObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Unregisters `id`. Returns `false` when it was not registered.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notifies every observer in registration order.
    ///
    /// Returns the number of observers whose callback panicked.
    pub fn notify_all(&self) -> usize {
        let mut failed = 0;
        for (id, observer) in &self.entries {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.data_model_changed()));
            if outcome.is_err() {
                failed += 1;
                error!(
                    "event=observer_notify module=service status=error observer={} error_code=observer_panicked",
                    id
                );
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::{DataModelObserver, ObserverList};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl DataModelObserver for Recorder {
        fn data_model_changed(&self) {
            self.log.borrow_mut().push(self.name);
        }
    }

    struct Exploding;

    impl DataModelObserver for Exploding {
        fn data_model_changed(&self) {
            panic!("observer failure");
        }
    }

    fn recorder(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn notifies_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = ObserverList::new();
        observers.add(recorder("first", &log));
        observers.add(recorder("second", &log));

        assert_eq!(observers.notify_all(), 0);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn removed_observer_is_not_notified() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = ObserverList::new();
        let first = observers.add(recorder("first", &log));
        observers.add(recorder("second", &log));

        assert!(observers.remove(first));
        assert!(!observers.remove(first));
        observers.notify_all();
        assert_eq!(*log.borrow(), vec!["second"]);
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn panicking_observer_does_not_block_later_ones() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = ObserverList::new();
        observers.add(Arc::new(Exploding));
        observers.add(recorder("after", &log));

        assert_eq!(observers.notify_all(), 1);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = ObserverList::new();
        let first = observers.add(recorder("a", &log));
        observers.remove(first);
        let second = observers.add(recorder("b", &log));
        assert_ne!(first, second);
    }
}
