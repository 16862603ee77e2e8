use anyhow::Context;
use regex::Regex;
use crate::models::AuditMap;

/// Shell-style pattern: `*` matches any run of characters, `?` exactly one, everything else
/// literally. The whole input has to match.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, anyhow::Error> {
        let mut expression = String::with_capacity(pattern.len() + 8);
        expression.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expression.push_str(".*"),
                '?' => expression.push('.'),
                c => expression.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        expression.push('$');

        let regex = Regex::new(&expression)
            .with_context(|| format!("While compiling filter pattern '{}'", pattern))?;

        Ok(Self {
            source: pattern.to_owned(),
            regex,
        })
    }

    pub fn any() -> Self {
        Self {
            source: "*".to_owned(),
            regex: Regex::new("^.*$").expect("Static pattern is valid"),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for GlobPattern {
    fn default() -> Self {
        Self::any()
    }
}

/// Independent patterns over group id, topic and owning member. A record is kept only when
/// all three match.
#[derive(Debug, Clone, Default)]
pub struct OffsetFilter {
    pub group: GlobPattern,
    pub topic: GlobPattern,
    pub consumer: GlobPattern,
}

impl OffsetFilter {
    pub fn new(group: &str, topic: &str, consumer: &str) -> Result<Self, anyhow::Error> {
        Ok(Self {
            group: GlobPattern::new(group)?,
            topic: GlobPattern::new(topic)?,
            consumer: GlobPattern::new(consumer)?,
        })
    }

    pub fn matches(&self, group: &str, topic: &str, owning_member: &str) -> bool {
        self.group.matches(group) && self.topic.matches(topic) && self.consumer.matches(owning_member)
    }

    /// Drops non matching records, then groups and topics left without records.
    pub fn apply(&self, mut map: AuditMap) -> AuditMap {
        map.retain(|group, topics| {
            if !self.group.matches(group) {
                return false;
            }
            topics.retain(|topic, partitions| {
                if !self.topic.matches(topic) {
                    return false;
                }
                partitions.retain(|_, record| self.consumer.matches(&record.owning_member));
                !partitions.is_empty()
            });
            !topics.is_empty()
        });

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditRecord, CoordinationKind};

    fn record(owner: &str) -> AuditRecord {
        AuditRecord {
            oldest_offset: Some(0),
            newest_offset: Some(10),
            lag: Some(5),
            consumed_offset: 5,
            owning_member: owner.to_owned(),
            coordination_kind: CoordinationKind::BrokerManaged,
        }
    }

    fn sample() -> AuditMap {
        let mut map = AuditMap::new();
        for (group, topic, owner) in [
            ("order-svc", "orders", "order-svc-1"),
            ("order-svc", "payments", ""),
            ("billing-svc", "orders", "billing-svc-7"),
        ] {
            map.entry(group.to_owned())
                .or_default()
                .entry(topic.to_owned())
                .or_default()
                .insert(0, record(owner));
        }
        map
    }

    #[test]
    fn star_matches_everything_including_empty() {
        let pattern = GlobPattern::any();
        assert!(pattern.matches(""));
        assert!(pattern.matches("anything at all"));
    }

    #[test]
    fn glob_is_anchored_and_escapes_regex_characters() {
        let pattern = GlobPattern::new("order.?vc").unwrap();
        assert!(pattern.matches("order.svc"));
        assert!(!pattern.matches("order-svc"));
        assert!(!pattern.matches("xorder.svc"));
    }

    #[test]
    fn group_pattern_keeps_matching_groups_only() {
        let filter = OffsetFilter::new("order*", "*", "*").unwrap();

        let filtered = filter.apply(sample());

        assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["order-svc"]);
        assert_eq!(filtered["order-svc"].len(), 2);
    }

    #[test]
    fn consumer_pattern_drops_unowned_partitions_and_empty_topics() {
        let filter = OffsetFilter::new("*", "*", "*-svc-?").unwrap();

        let filtered = filter.apply(sample());

        assert_eq!(filtered.len(), 2);
        assert!(!filtered["order-svc"].contains_key("payments"));
    }

    #[test]
    fn all_three_patterns_must_match() {
        let filter = OffsetFilter::new("billing*", "payments", "*").unwrap();

        assert!(filter.apply(sample()).is_empty());
        assert!(filter.matches("billing-svc", "payments", ""));
        assert!(!filter.matches("billing-svc", "orders", ""));
    }
}
