use crate::models::KindSelector;

#[derive(Debug, Clone, Copy, Default)]
pub struct ListGroupsQuery {
    pub kind: KindSelector,
}
