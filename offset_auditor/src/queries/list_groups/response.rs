use crate::models::CoordinationKind;
use std::collections::BTreeMap;

/// Group id -> how the group is coordinated.
pub type GroupDirectory = BTreeMap<String, CoordinationKind>;
