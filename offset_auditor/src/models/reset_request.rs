/// Overwrite of a group's committed offset on one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    pub group: String,
    pub topic: String,
    pub partition: i32,
    pub target_offset: i64,
}
