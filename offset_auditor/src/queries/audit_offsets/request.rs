use crate::filter::OffsetFilter;
use crate::models::KindSelector;

#[derive(Debug, Clone, Default)]
pub struct AuditOffsetsQuery {
    pub kind: KindSelector,
    pub filter: OffsetFilter,
}
