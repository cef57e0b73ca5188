//! Bean instances are handed out according to their definition's [Scope]. Singletons are created
//! once and kept in [InstanceScopes] for the lifetime of the factory, while prototypes are created
//! anew on every request and never stored.
//!
//! Note: scope resolution happens at bean creation time, which can lead to unexpected consequences
//! if scopes are mixed together, e.g. a singleton can depend on a prototype. In such case when
//! creating the singleton, a new instance of the dependency will be created, since it's a
//! prototype, but then that single instance will live as long as the singleton lives.
//!
//! Creation is guarded per thread: every thread keeps a stack of the beans it is currently
//! creating, and requesting a bean already on that stack is reported as a
//! [circular dependency](BeanFactoryError::CircularDependency). Singleton creation is additionally
//! owned by a single thread at a time. Other threads requesting the same singleton wait for the
//! owner to finish, unless waiting would close a cycle between threads, which is reported as a
//! circular dependency as well.

use crate::bean_class::BeanPtr;
use crate::error::BeanFactoryError;
use fxhash::FxHashMap;
use parking_lot::{Condvar, Mutex, RwLock};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::thread::{self, ThreadId};
use thiserror::Error;
use tracing::trace;

/// Name of the [Scope::Singleton].
pub const SINGLETON: &str = "singleton";

/// Name of the [Scope::Prototype].
pub const PROTOTYPE: &str = "prototype";

/// Lifetime policy of a bean.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Scope {
    /// A single instance, created on first request and shared afterwards.
    #[default]
    Singleton,
    /// A new instance on each request.
    Prototype,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Singleton => f.write_str(SINGLETON),
            Scope::Prototype => f.write_str(PROTOTYPE),
        }
    }
}

#[derive(Error, Clone, Eq, PartialEq, Debug)]
#[error("Unrecognized scope: {0}")]
pub struct UnrecognizedScope(pub String);

impl FromStr for Scope {
    type Err = UnrecognizedScope;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case(SINGLETON) {
            Ok(Scope::Singleton)
        } else if value.eq_ignore_ascii_case(PROTOTYPE) {
            Ok(Scope::Prototype)
        } else {
            Err(UnrecognizedScope(value.to_string()))
        }
    }
}

/// Result of a single creation. `None` means a post-processor discarded the bean.
pub type CreatedBean = Result<Option<BeanPtr>, BeanFactoryError>;

#[derive(Default, Debug)]
struct CreationState {
    // beans currently being created, per thread, in request order
    stacks: FxHashMap<ThreadId, Vec<String>>,
    // singleton name -> thread creating it
    owners: FxHashMap<String, ThreadId>,
    // thread -> singleton name it waits for
    waiting: FxHashMap<ThreadId, String>,
}

impl CreationState {
    fn check_not_in_creation(&self, thread: ThreadId, name: &str) -> Result<(), BeanFactoryError> {
        match self.stacks.get(&thread) {
            Some(stack) if stack.iter().any(|entry| entry == name) => {
                Err(self.cycle(thread, name))
            }
            _ => Ok(()),
        }
    }

    fn cycle(&self, thread: ThreadId, name: &str) -> BeanFactoryError {
        let mut path = self.stacks.get(&thread).cloned().unwrap_or_default();
        path.push(name.to_string());
        BeanFactoryError::CircularDependency(path)
    }

    // follows the wait-for chain starting at `owner` and checks if it leads back to `thread`
    fn waits_for(&self, owner: ThreadId, thread: ThreadId) -> bool {
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            if current == thread {
                return true;
            }

            match self
                .waiting
                .get(&current)
                .and_then(|name| self.owners.get(name))
            {
                Some(next) => current = *next,
                None => return false,
            }
        }

        false
    }

    fn push(&mut self, thread: ThreadId, name: &str) {
        self.stacks
            .entry(thread)
            .or_default()
            .push(name.to_string());
    }

    fn pop(&mut self, thread: ThreadId) {
        if let Some(stack) = self.stacks.get_mut(&thread) {
            stack.pop();
            if stack.is_empty() {
                self.stacks.remove(&thread);
            }
        }
    }
}

/// Storage for singletons and bookkeeping of beans under construction.
#[derive(Default)]
pub struct InstanceScopes {
    singletons: RwLock<FxHashMap<String, Option<BeanPtr>>>,
    state: Mutex<CreationState>,
    creation_finished: Condvar,
}

impl InstanceScopes {
    /// Returns the stored singleton outcome, if the singleton has already been created.
    pub fn singleton(&self, name: &str) -> Option<Option<BeanPtr>> {
        self.singletons.read().get(name).cloned()
    }

    #[inline]
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.read().contains_key(name)
    }

    #[inline]
    pub fn singleton_count(&self) -> usize {
        self.singletons.read().len()
    }

    /// Returns the stored singleton or creates it with the given function. At most one successful
    /// creation happens per name. A failed creation is not stored.
    pub fn singleton_or_create<F: FnOnce() -> CreatedBean>(&self, name: &str, create: F) -> CreatedBean {
        if let Some(instance) = self.singleton(name) {
            return Ok(instance);
        }

        let thread = thread::current().id();
        let guard = {
            let mut state = self.state.lock();
            loop {
                if let Some(instance) = self.singleton(name) {
                    return Ok(instance);
                }

                state.check_not_in_creation(thread, name)?;

                match state.owners.get(name).copied() {
                    None => {
                        state.owners.insert(name.to_string(), thread);
                        state.push(thread, name);
                        break;
                    }
                    Some(owner) => {
                        if state.waits_for(owner, thread) {
                            return Err(state.cycle(thread, name));
                        }

                        trace!(bean = name, "Waiting for singleton created by another thread.");

                        state.waiting.insert(thread, name.to_string());
                        self.creation_finished.wait(&mut state);
                        state.waiting.remove(&thread);
                    }
                }
            }

            CreationGuard {
                scopes: self,
                thread,
                owned_singleton: Some(name),
            }
        };

        let result = create();
        if let Ok(instance) = &result {
            self.singletons
                .write()
                .insert(name.to_string(), instance.clone());
        }

        drop(guard);
        result
    }

    /// Creates a new instance with the given function, guarding against cycles.
    pub fn create_prototype<F: FnOnce() -> CreatedBean>(&self, name: &str, create: F) -> CreatedBean {
        let thread = thread::current().id();
        let _guard = {
            let mut state = self.state.lock();
            state.check_not_in_creation(thread, name)?;
            state.push(thread, name);

            CreationGuard {
                scopes: self,
                thread,
                owned_singleton: None,
            }
        };

        create()
    }
}

// releases creation bookkeeping, even when creation panics
struct CreationGuard<'a> {
    scopes: &'a InstanceScopes,
    thread: ThreadId,
    owned_singleton: Option<&'a str>,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.scopes.state.lock();
        state.pop(self.thread);

        if let Some(name) = self.owned_singleton {
            state.owners.remove(name);
            drop(state);
            self.scopes.creation_finished.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bean_class::BeanPtr;
    use crate::error::BeanFactoryError;
    use crate::scope::{InstanceScopes, Scope};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn should_parse_scope_names() {
        assert_eq!("singleton".parse::<Scope>().unwrap(), Scope::Singleton);
        assert_eq!("PROTOTYPE".parse::<Scope>().unwrap(), Scope::Prototype);
        assert!("request".parse::<Scope>().is_err());
        assert_eq!(Scope::default(), Scope::Singleton);
    }

    #[test]
    fn should_store_singletons() {
        let scopes = InstanceScopes::default();

        let first = scopes
            .singleton_or_create("a", || Ok(Some(Arc::new(1) as BeanPtr)))
            .unwrap()
            .unwrap();
        let second = scopes
            .singleton_or_create("a", || panic!("singleton created twice"))
            .unwrap()
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(scopes.contains_singleton("a"));
    }

    #[test]
    fn should_store_discarded_singletons() {
        let scopes = InstanceScopes::default();

        assert!(scopes.singleton_or_create("a", || Ok(None)).unwrap().is_none());
        assert!(scopes
            .singleton_or_create("a", || panic!("singleton created twice"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn should_not_store_failures() {
        let scopes = InstanceScopes::default();

        assert!(scopes
            .singleton_or_create("a", || Err(BeanFactoryError::NoSuchBeanDefinition(
                "b".to_string()
            )))
            .is_err());
        assert!(!scopes.contains_singleton("a"));
        assert!(scopes
            .singleton_or_create("a", || Ok(Some(Arc::new(1) as BeanPtr)))
            .is_ok());
    }

    #[test]
    fn should_detect_singleton_cycles() {
        let scopes = InstanceScopes::default();

        let error = scopes
            .singleton_or_create("a", || {
                scopes.singleton_or_create("b", || {
                    scopes.singleton_or_create("a", || Ok(None))
                })
            })
            .unwrap_err();

        assert!(matches!(
            error,
            BeanFactoryError::CircularDependency(path) if path == ["a", "b", "a"]
        ));
        assert_eq!(scopes.singleton_count(), 0);
    }

    #[test]
    fn should_detect_prototype_cycles() {
        let scopes = InstanceScopes::default();

        let error = scopes
            .create_prototype("a", || scopes.create_prototype("a", || Ok(None)))
            .unwrap_err();

        assert!(matches!(error, BeanFactoryError::CircularDependency(_)));
        assert!(scopes.create_prototype("a", || Ok(None)).is_ok());
    }

    #[test]
    fn should_create_singleton_once_under_contention() {
        let scopes = Arc::new(InstanceScopes::default());
        let created = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scopes = scopes.clone();
                let created = created.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    scopes
                        .singleton_or_create("a", || {
                            created.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(Some(Arc::new(1) as BeanPtr))
                        })
                        .unwrap()
                        .unwrap()
                })
            })
            .collect();

        let instances: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(instances
            .windows(2)
            .all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn should_not_block_different_singletons() {
        let scopes = Arc::new(InstanceScopes::default());
        let barrier = Arc::new(Barrier::new(2));

        let handle = {
            let scopes = scopes.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                scopes.singleton_or_create("a", || {
                    // "b" gets created while "a" is still in progress
                    barrier.wait();
                    barrier.wait();
                    Ok(Some(Arc::new(1) as BeanPtr))
                })
            })
        };

        barrier.wait();
        assert!(scopes
            .singleton_or_create("b", || Ok(Some(Arc::new(2) as BeanPtr)))
            .is_ok());
        barrier.wait();

        assert!(handle.join().unwrap().is_ok());
        assert_eq!(scopes.singleton_count(), 2);
    }

    #[test]
    fn should_detect_cycles_across_threads() {
        let scopes = Arc::new(InstanceScopes::default());
        let barrier = Arc::new(Barrier::new(2));

        // each thread owns one singleton and then asks for the other one
        let spawn = |own: &'static str, other: &'static str| {
            let scopes = scopes.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                scopes.singleton_or_create(own, || {
                    barrier.wait();
                    scopes
                        .singleton_or_create(other, || Ok(Some(Arc::new(other) as BeanPtr)))
                        .map(|_| Some(Arc::new(own) as BeanPtr))
                })
            })
        };

        let first = spawn("a", "b");
        let second = spawn("b", "a");

        let results = [first.join().unwrap(), second.join().unwrap()];
        let cycles = results
            .iter()
            .filter(|result| matches!(result, Err(BeanFactoryError::CircularDependency(path)) if path.len() == 2))
            .count();

        assert_eq!(cycles, 1);
        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert_eq!(scopes.singleton_count(), 2);
    }
}
