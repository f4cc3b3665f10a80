use mirror_core::{Entry, Handler, Lookup};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Routes entries to handlers by locator scheme and host
///
/// A route registered for an exact `(scheme, host)` pair wins over a route
/// registered for the scheme alone.
#[derive(Default, Clone)]
pub struct Registry {
    hosts: HashMap<(String, String), Arc<dyn Handler>>,
    schemes: HashMap<String, Arc<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every locator with `scheme` to `handler`
    pub fn with_scheme(mut self, scheme: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.schemes
            .insert(scheme.into().to_ascii_lowercase(), handler);
        self
    }

    /// Route locators with exactly this `scheme` and `host` to `handler`
    pub fn with_host(
        mut self,
        scheme: impl Into<String>,
        host: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        self.hosts.insert(
            (
                scheme.into().to_ascii_lowercase(),
                host.into().to_ascii_lowercase(),
            ),
            handler,
        );
        self
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.hosts.len() + self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Lookup for Registry {
    fn lookup(&self, entry: &Entry) -> Option<Arc<dyn Handler>> {
        let scheme = entry.locator.scheme();

        if let Some(host) = entry.locator.host_str() {
            let key = (scheme.to_string(), host.to_ascii_lowercase());
            if let Some(handler) = self.hosts.get(&key) {
                return Some(Arc::clone(handler));
            }
        }

        self.schemes.get(scheme).map(Arc::clone)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hosts: Vec<String> = self
            .hosts
            .keys()
            .map(|(scheme, host)| format!("{}://{}", scheme, host))
            .collect();
        hosts.sort();
        let mut schemes: Vec<&String> = self.schemes.keys().collect();
        schemes.sort();

        f.debug_struct("Registry")
            .field("hosts", &hosts)
            .field("schemes", &schemes)
            .finish()
    }
}
