use crate::models::CoordinationKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// No broker (or coordination store) answered the listing; nothing else can run.
    #[error("Failed to read cluster metadata")]
    Metadata(#[source] anyhow::Error),

    /// `partition` is `None` when the topic's partition list itself couldn't be read.
    #[error("Failed to fetch produced offsets of topic '{topic}'{}", partition_note(.partition))]
    OffsetQuery {
        topic: String,
        partition: Option<i32>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to resolve consumed offsets of group '{group}'")]
    ConsumedResolution {
        group: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "Offset {requested} is outside the retained range [{oldest}, {newest}] of topic '{topic}' partition {partition}"
    )]
    OutOfRangeReset {
        group: String,
        topic: String,
        partition: i32,
        requested: i64,
        oldest: i64,
        newest: i64,
    },

    /// `applied_to` lists the backends still holding the new offset after the failed reset
    /// was rolled back as far as possible.
    #[error(
        "Failed to commit offset for group '{group}' topic '{topic}' partition {partition}{}",
        applied_note(.applied_to)
    )]
    Commit {
        group: String,
        topic: String,
        partition: i32,
        applied_to: Vec<CoordinationKind>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read offset snapshot '{}'", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl AuditError {
    /// Message of the error followed by all of its causes, `outer: inner: root`.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

fn partition_note(partition: &Option<i32>) -> String {
    partition.map_or_else(String::new, |x| format!(" partition {}", x))
}

fn applied_note(applied_to: &[CoordinationKind]) -> String {
    if applied_to.is_empty() {
        return String::new();
    }
    let kinds = applied_to
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(", new offset left in: {}", kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn report_includes_every_cause() {
        let error = AuditError::ConsumedResolution {
            group: "orders".to_owned(),
            source: anyhow!("connection refused").context("While fetching committed offsets"),
        };

        assert_eq!(
            error.report(),
            "Failed to resolve consumed offsets of group 'orders': While fetching committed offsets: connection refused"
        );
    }

    #[test]
    fn topic_level_offset_failure_names_no_partition() {
        let error = AuditError::OffsetQuery {
            topic: "bad".to_owned(),
            partition: None,
            source: anyhow!("leader not available"),
        };

        assert_eq!(
            error.to_string(),
            "Failed to fetch produced offsets of topic 'bad'"
        );
    }

    #[test]
    fn partial_commit_names_backends_left_written() {
        let error = AuditError::Commit {
            group: "orders".to_owned(),
            topic: "t1".to_owned(),
            partition: 0,
            applied_to: vec![CoordinationKind::BrokerManaged],
            source: anyhow!("session expired"),
        };

        assert_eq!(
            error.to_string(),
            "Failed to commit offset for group 'orders' topic 't1' partition 0, new offset left in: kf"
        );
    }
}
