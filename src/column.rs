use crate::{value::Domain, BoundedString};

/// An attribute's metadata: its name and the domain its values come from.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: BoundedString,
    domain: Domain,
}

impl Column {
    pub fn new(name: BoundedString, domain: Domain) -> Self {
        Self { name, domain }
    }

    pub fn name(&self) -> &BoundedString {
        &self.name
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }
}
