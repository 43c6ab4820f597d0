//! Mutex lock recovery so one panicked observer cannot wedge a page session.

use std::sync::{Mutex, MutexGuard};

pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(context, "mutex poisoned; recovering");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::lock_or_recover;
    use std::sync::Mutex;

    #[test]
    fn lock_or_recover_recovers_from_poisoned_mutex() {
        let lock = Mutex::new(vec!["first".to_string()]);
        let _ = std::panic::catch_unwind(|| {
            let _guard = match lock.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("initial lock acquisition should succeed"),
            };
            panic!("intentional poisoning for recovery test");
        });
        assert!(lock.is_poisoned());

        lock_or_recover(&lock, "speech-log").push("second".to_string());
        let value = lock_or_recover(&lock, "speech-log");
        assert_eq!(*value, vec!["first".to_string(), "second".to_string()]);
    }
}
