#![allow(dead_code)]
use stash_core::{KeyFactory, QueryKey};

/// Key factories for the three demo resources.
pub fn factories() -> [KeyFactory; 3] {
    [
        KeyFactory::new("todos"),
        KeyFactory::new("meals"),
        KeyFactory::new("employees"),
    ]
}

/// A representative set of keys across every resource and scope.
pub fn sample_keys() -> Vec<QueryKey> {
    let mut keys = Vec::new();
    for factory in factories() {
        keys.push(factory.all());
        keys.push(factory.lists());
        keys.push(factory.list("limit:30,skip:0"));
        keys.push(factory.list("limit:30,skip:30"));
        keys.push(factory.details());
        keys.push(factory.detail(5));
        keys.push(factory.detail("52874"));
    }
    keys
}
