//! Logical topics carrying the two unified tables.

/// A logical topic: the public name the read API speaks, plus the backing
/// JetStream stream and subject. Keys are unused; ordering is topic-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub name: &'static str,
    pub stream: &'static str,
    pub subject: &'static str,
}

/// Unified request rows.
pub const TOPIC_REQUESTS: Topic = Topic {
    name: "scm_requests",
    stream: "SCM_REQUESTS",
    subject: "scm.requests",
};

/// Unified inventory rows.
pub const TOPIC_INVENTORY: Topic = Topic {
    name: "scm_inventory",
    stream: "SCM_INVENTORY",
    subject: "scm.inventory",
};

impl Topic {
    /// Look up a topic by its public name.
    pub fn by_name(name: &str) -> Option<Topic> {
        match name {
            "scm_requests" => Some(TOPIC_REQUESTS),
            "scm_inventory" => Some(TOPIC_INVENTORY),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(Topic::by_name("scm_requests"), Some(TOPIC_REQUESTS));
        assert_eq!(Topic::by_name("scm_inventory"), Some(TOPIC_INVENTORY));
        assert_eq!(Topic::by_name("nope"), None);
    }
}
