//! Owner lifecycle signals and their observers.

use super::CategorizableResult;

/// Lifecycle signals emitted by the host when an owner is persisted or removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Created,
    Deleted,
}

/// Receiver of owner lifecycle signals.
pub trait LifecycleObserver<O> {
    /// The owner has just received its identity.
    fn created(&self, owner: &mut O) -> CategorizableResult<()>;
    /// The owner has just been deleted.
    fn deleted(&self, owner: &O) -> CategorizableResult<()>;
}

/// Registry of observers notified, in registration order, for one owner type.
pub struct LifecycleHooks<'a, O> {
    observers: Vec<Box<dyn LifecycleObserver<O> + 'a>>,
}

impl<O> Default for LifecycleHooks<'_, O> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
        }
    }
}

impl<'a, O> LifecycleHooks<'a, O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: impl LifecycleObserver<O> + 'a) -> &mut Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Notify every observer of `event`; the first failure stops the chain.
    pub fn fire(&self, event: LifecycleEvent, owner: &mut O) -> CategorizableResult<()> {
        for observer in &self.observers {
            match event {
                LifecycleEvent::Created => observer.created(owner)?,
                LifecycleEvent::Deleted => observer.deleted(owner)?,
            }
        }
        Ok(())
    }
}

impl<O, T: LifecycleObserver<O> + ?Sized> LifecycleObserver<O> for &T {
    fn created(&self, owner: &mut O) -> CategorizableResult<()> {
        (**self).created(owner)
    }

    fn deleted(&self, owner: &O) -> CategorizableResult<()> {
        (**self).deleted(owner)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::domain::types::TypeConstraintError;

    #[derive(Default)]
    struct Calls {
        seen: RefCell<Vec<String>>,
    }

    struct Observer<'a> {
        name: &'static str,
        calls: &'a Calls,
        fail: bool,
    }

    fn observer<'a>(name: &'static str, calls: &'a Calls, fail: bool) -> Observer<'a> {
        Observer { name, calls, fail }
    }

    impl LifecycleObserver<u32> for Observer<'_> {
        fn created(&self, owner: &mut u32) -> CategorizableResult<()> {
            self.calls
                .seen
                .borrow_mut()
                .push(format!("{}:created:{owner}", self.name));
            if self.fail {
                return Err(TypeConstraintError::InvalidValue("boom".into()).into());
            }
            *owner += 1;
            Ok(())
        }

        fn deleted(&self, owner: &u32) -> CategorizableResult<()> {
            self.calls
                .seen
                .borrow_mut()
                .push(format!("{}:deleted:{owner}", self.name));
            Ok(())
        }
    }

    #[test]
    fn fires_observers_in_registration_order() {
        let calls = Calls::default();
        let mut hooks = LifecycleHooks::new();
        assert!(hooks.is_empty());

        hooks
            .register(observer("first", &calls, false))
            .register(observer("second", &calls, false));
        assert_eq!(hooks.len(), 2);

        let mut owner = 1;
        hooks.fire(LifecycleEvent::Created, &mut owner).unwrap();
        hooks.fire(LifecycleEvent::Deleted, &mut owner).unwrap();

        assert_eq!(
            *calls.seen.borrow(),
            vec![
                "first:created:1",
                "second:created:2",
                "first:deleted:3",
                "second:deleted:3",
            ]
        );
    }

    #[test]
    fn first_failure_stops_the_chain() {
        let calls = Calls::default();
        let mut hooks = LifecycleHooks::new();
        hooks
            .register(observer("failing", &calls, true))
            .register(observer("skipped", &calls, false));

        let mut owner = 1;
        assert!(hooks.fire(LifecycleEvent::Created, &mut owner).is_err());
        assert_eq!(*calls.seen.borrow(), vec!["failing:created:1"]);
    }
}
