use std::collections::HashMap;
use std::sync::Arc;

use tera::{Filter, Tera, Value};

/// Named template helpers, registered into every Tera instance the build
/// creates.
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: Vec<(String, Arc<dyn Filter>)>,
}

impl HelperRegistry {
    /// Register a helper. A later registration under the same name wins.
    pub fn register<F: Filter + 'static>(&mut self, name: &str, helper: F) {
        let helper: Arc<dyn Filter> = Arc::new(helper);
        match self.helpers.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = helper,
            None => self.helpers.push((name.to_string(), helper)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.iter().map(|(name, _)| name.as_str())
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Register every helper as a Tera filter.
    pub fn register_into(&self, tera: &mut Tera) {
        for (name, helper) in &self.helpers {
            let helper = Arc::clone(helper);
            tera.register_filter(
                name,
                move |value: &Value, args: &HashMap<String, Value>| helper.filter(value, args),
            );
        }
    }
}

impl std::fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
