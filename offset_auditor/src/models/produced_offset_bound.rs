use anyhow::bail;
use getset::Getters;
use std::collections::BTreeMap;

/// Retained range of a partition log at read time.
#[derive(Debug, Getters, Copy, Clone, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct ProducedOffsetBound {
    oldest_offset: i64,
    newest_offset: i64,
}

impl ProducedOffsetBound {
    pub fn try_new(oldest_offset: i64, newest_offset: i64) -> Result<Self, anyhow::Error> {
        if newest_offset < oldest_offset {
            bail!(
                "Newest offset {} is lower than oldest offset {}",
                newest_offset,
                oldest_offset
            )
        }

        Ok(Self {
            oldest_offset,
            newest_offset,
        })
    }

    pub fn contains(&self, offset: i64) -> bool {
        (self.oldest_offset..=self.newest_offset).contains(&offset)
    }

    pub fn messages_count(&self) -> i64 {
        self.newest_offset - self.oldest_offset
    }
}

/// Topic -> partition -> bound.
pub type ProducedOffsets = BTreeMap<String, BTreeMap<i32, ProducedOffsetBound>>;
