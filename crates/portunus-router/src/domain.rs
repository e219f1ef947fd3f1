//! Domains: named virtual hosts owning services.
//!
//! A domain is an immutable set of host aliases bound to one network
//! address, plus an ordered collection of services. Domains are built once
//! via [`DomainBuilder`]; the router resolves exactly one domain per
//! (host, address) pair.

use std::net::SocketAddr;
use std::sync::Arc;

use http::Method;

use portunus_core::{PortunusError, PortunusResult};

use crate::params::Params;
use crate::service::{Service, ServiceUnit};

/// A named virtual host bound to one network address.
pub struct Domain {
    names: Vec<String>,
    address: SocketAddr,
    services: Vec<Arc<dyn ServiceUnit>>,
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("names", &self.names)
            .field("address", &self.address)
            .field("services", &self.services.len())
            .finish()
    }
}

impl Domain {
    /// Creates a new domain builder bound to `address`.
    #[must_use]
    pub fn builder(address: SocketAddr) -> DomainBuilder {
        DomainBuilder {
            names: Vec::new(),
            address,
            services: Vec::new(),
        }
    }

    /// Returns the host aliases, lowercased.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the bound network address.
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Returns the ordered services.
    #[must_use]
    pub fn services(&self) -> &[Arc<dyn ServiceUnit>] {
        &self.services
    }

    /// Returns true if one of this domain's names matches `host`,
    /// case-insensitively.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        self.names.iter().any(|name| name.eq_ignore_ascii_case(host))
    }

    /// Returns true if this domain has no names and therefore serves as
    /// the address-only fallback.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.names.is_empty()
    }

    /// Selects the service for a path and method.
    ///
    /// The most specific matching template wins; exact specificity ties
    /// fall back to registration order. A path that matches only services
    /// rejecting the method yields `MethodNotAllowed`; a path matching
    /// nothing yields `ServiceNotFound`.
    pub(crate) fn resolve(
        &self,
        path: &str,
        method: &Method,
    ) -> PortunusResult<(Arc<dyn ServiceUnit>, Params)> {
        let mut best: Option<((usize, usize, bool), Arc<dyn ServiceUnit>, Params)> = None;
        let mut path_matched = false;

        for service in &self.services {
            let Some(params) = service.path_spec().matches(path) else {
                continue;
            };
            path_matched = true;
            if !service.methods().contains(method) {
                continue;
            }
            let score = service.path_spec().specificity();
            // Strict comparison keeps the earliest-registered on a tie.
            if best.as_ref().map_or(true, |(top, _, _)| score > *top) {
                best = Some((score, Arc::clone(service), params));
            }
        }

        match best {
            Some((_, service, params)) => Ok((service, params)),
            None if path_matched => Err(PortunusError::method_not_allowed(
                method.as_str(),
                path,
            )),
            None => Err(PortunusError::service_not_found(path)),
        }
    }
}

/// One-shot builder producing an immutable [`Domain`].
pub struct DomainBuilder {
    names: Vec<String>,
    address: SocketAddr,
    services: Vec<Arc<dyn ServiceUnit>>,
}

impl DomainBuilder {
    /// Adds a host alias. Stored lowercased; matching is case-insensitive.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into().to_ascii_lowercase());
        self
    }

    /// Appends a service, preserving registration order.
    #[must_use]
    pub fn service(self, service: Service) -> Self {
        self.service_unit(Arc::new(service))
    }

    /// Appends an already-shared (possibly decorated) service.
    #[must_use]
    pub fn service_unit(mut self, service: Arc<dyn ServiceUnit>) -> Self {
        self.services.push(service);
        self
    }

    /// Builds the immutable domain.
    ///
    /// # Errors
    ///
    /// Returns [`PortunusError::Configuration`] if the same alias is added
    /// twice.
    pub fn build(self) -> PortunusResult<Domain> {
        for (index, name) in self.names.iter().enumerate() {
            if self.names[..index].contains(name) {
                return Err(PortunusError::configuration(format!(
                    "duplicate host alias {name:?}"
                )));
            }
        }
        Ok(Domain {
            names: self.names,
            address: self.address,
            services: self.services,
        })
    }
}
