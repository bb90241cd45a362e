use crate::domain::BookingIntent;
use anyhow::Result;
use log::{info, warn};

/// Receives a guest's committed stay once the calendar hands it off.
pub trait SubmissionHook: Send + Sync {
    fn on_booking_intent(&self, property_id: &str, intent: &BookingIntent) -> Result<()>;

    /// Human-readable name for this hook
    fn name(&self) -> &str;

    /// A failing required hook fails the whole submission.
    fn required(&self) -> bool {
        true
    }
}

/// Ordered set of submission hooks.
pub struct HookRegistry {
    hooks: Vec<Box<dyn SubmissionHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn register<H>(&mut self, hook: H)
    where
        H: SubmissionHook + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Runs every hook in registration order. Stops at the first required
    /// hook that fails; optional failures are logged and skipped.
    pub fn dispatch(&self, property_id: &str, intent: &BookingIntent) -> Result<()> {
        for hook in &self.hooks {
            match hook.on_booking_intent(property_id, intent) {
                Ok(()) => {}
                Err(e) if hook.required() => {
                    return Err(e.context(format!("Hook '{}' failed", hook.name())));
                }
                Err(e) => warn!("Hook '{}' failed: {:#}", hook.name(), e),
            }
        }
        info!(
            "booking intent for {} {}..{} handed to {} hook(s)",
            property_id,
            intent.check_in,
            intent.check_out,
            self.hooks.len()
        );
        Ok(())
    }

    pub fn list_hooks(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
        required: bool,
    }

    impl SubmissionHook for Recorder {
        fn on_booking_intent(&self, _property_id: &str, _intent: &BookingIntent) -> Result<()> {
            self.seen.lock().unwrap().push(self.name);
            if self.fail {
                bail!("{} is down", self.name);
            }
            Ok(())
        }

        fn name(&self) -> &str {
            self.name
        }

        fn required(&self) -> bool {
            self.required
        }
    }

    fn intent() -> BookingIntent {
        BookingIntent {
            check_in: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            nights: 3,
            total_price: 554_000,
        }
    }

    fn registry(
        hooks: &[(&'static str, bool, bool)],
        seen: &Arc<Mutex<Vec<&'static str>>>,
    ) -> HookRegistry {
        let mut registry = HookRegistry::new();
        for &(name, fail, required) in hooks {
            registry.register(Recorder {
                name,
                seen: Arc::clone(seen),
                fail,
                required,
            });
        }
        registry
    }

    #[test]
    fn test_optional_failure_does_not_abort() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&[("log", true, false), ("payment", false, true)], &seen);

        registry.dispatch("villa-1", &intent()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["log", "payment"]);
    }

    #[test]
    fn test_required_failure_surfaces_and_stops() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&[("payment", true, true), ("log", false, false)], &seen);

        let err = registry.dispatch("villa-1", &intent()).unwrap_err();
        assert!(format!("{:#}", err).contains("payment is down"));
        assert_eq!(*seen.lock().unwrap(), vec!["payment"]);
    }

    #[test]
    fn test_list_hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&[("a", false, true), ("b", false, false)], &seen);
        assert_eq!(registry.list_hooks(), vec!["a", "b"]);
        assert!(HookRegistry::default().is_empty());
    }
}
