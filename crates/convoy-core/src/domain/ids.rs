//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type で型付けする。
//! `TaskId` と `GroupId` は同じ 16 bytes だが、コンパイル時に混同できない。
//! IDs exist for log correlation only; nothing is persisted.

use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait providing the `Display` prefix of each ID kind.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// Fresh, time-ordered ID.
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskMarker {}

impl IdMarker for TaskMarker {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Fan-out group のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupMarker {}

impl IdMarker for GroupMarker {
    fn prefix() -> &'static str {
        "group-"
    }
}

/// Identifier of one Task instance.
pub type TaskId = Id<TaskMarker>;

/// Identifier of one fan-out call (its cancellation domain).
pub type GroupId = Id<GroupMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_their_prefix() {
        let ulid = Ulid::new();
        let task = TaskId::from_ulid(ulid);
        let group: GroupId = ulid.into();

        assert_eq!(task.as_ulid(), group.as_ulid());
        assert_eq!(task.to_string(), format!("task-{ulid}"));
        assert_eq!(group.to_string(), format!("group-{ulid}"));
        // let _: TaskId = group; // <- does not compile
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(TaskId::generate(), TaskId::generate());
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<TaskId>(), size_of::<Ulid>());
        assert_eq!(size_of::<GroupId>(), 16);
    }
}
