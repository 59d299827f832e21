use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::Mutex;

use custodian_primitives::{Annotation, Identifier, Object};
use uuid::Uuid;

/// Fixed internal page size for cursor-paginated queries (§9.1).
pub const PAGE_SIZE: usize = 25;

/// One of the lifecycle flags an entity version can carry. Combinations are
/// restricted to the six allowed by invariant 6: empty, `{CreatePending}`,
/// `{CreateRejected}`, `{DeletePending}`, `{DeleteAccepted}`, or
/// `{CreatePending, DeletePending}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusT {
    CreatePending,
    CreateRejected,
    DeletePending,
    DeleteAccepted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityStatus(HashSet<StatusT>);

impl EntityStatus {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, status: StatusT) -> bool {
        self.0.contains(&status)
    }

    pub fn insert(&mut self, status: StatusT) {
        self.0.insert(status);
    }

    pub fn remove(&mut self, status: StatusT) {
        self.0.remove(&status);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    CreateOrUpdate,
    Delete,
}

#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub uuid: Uuid,
    pub versions: u64,
}

#[derive(Debug, Clone)]
pub struct AnnotationInfo {
    pub uuid: Uuid,
    pub versions: u64,
}

#[derive(Debug, Clone)]
pub struct SchemaInfo {
    pub name: String,
    pub uuid: Uuid,
    pub versions: u64,
}

#[derive(Debug, Clone)]
pub struct EventInfo {
    pub uuid: Uuid,
    pub kind: String,
    pub review: Option<(Uuid, bool)>,
}

#[derive(Debug, Clone, Default)]
pub struct Page<T, K = Uuid> {
    pub items: Vec<T>,
    pub next: Option<K>,
}

fn paginate<K: Ord + Copy, T: Clone>(ordered: &BTreeMap<K, T>, after: Option<K>) -> Page<T, K> {
    let bounds = match after {
        Some(cursor) => (Bound::Excluded(cursor), Bound::Unbounded),
        None => (Bound::Unbounded, Bound::Unbounded),
    };
    // Fetch one entry past the page so its presence signals more pages exist,
    // without ever handing that entry's key out as `next` — the cursor must
    // be the last entry actually *returned*, or the entry right after it gets
    // skipped by the caller's next `Bound::Excluded(cursor)` query.
    let mut fetched: Vec<(K, T)> =
        ordered.range(bounds).take(PAGE_SIZE + 1).map(|(k, v)| (*k, v.clone())).collect();
    let next = if fetched.len() > PAGE_SIZE {
        fetched.pop();
        fetched.last().map(|(k, _)| *k)
    } else {
        None
    };
    let items = fetched.into_iter().map(|(_, v)| v).collect();
    Page { items, next }
}

/// The five listing buckets spec.md §4.5 names ("list by status"). `Accepted`
/// is the current (tail) version of an entity with an empty status set;
/// `Deprecated` is an older version of the same entity that was itself
/// accepted before a newer version superseded it — still discoverable, per
/// §1, but excluded from the accepted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Pending,
    Accepted,
    Rejected,
    Deleted,
    Deprecated,
}

/// Derived indexes a `Machine` consults while validating and mutates while
/// consuming (§4.5). Reads and writes happen under the same per-dataset
/// critical section the caller already holds, so this trait does not need
/// its own transactional guarantees beyond internal consistency.
pub trait State: Send + Sync {
    fn object_versions(&self, uuid: Uuid) -> Vec<Object>;
    fn annotation_versions(&self, uuid: Uuid) -> Vec<Annotation>;
    fn schema_uuid_by_name(&self, name: &str) -> Option<Uuid>;
    fn schema_name_by_uuid(&self, uuid: Uuid) -> Option<String>;
    fn entity_status(&self, identifier: Identifier) -> EntityStatus;
    fn is_pending(&self, event_uuid: Uuid) -> bool;
    fn review_link(&self, target: Uuid) -> Option<(Uuid, bool)>;
    fn hash_owner(&self, hash: &str) -> Option<Uuid>;
    fn owners(&self) -> Vec<String>;
    fn owner_rank(&self, owner: &str) -> Option<usize>;
    fn object_identifiers_for_annotation(&self, uuid: Uuid) -> Vec<Identifier>;
    fn annotation_uuids_for_object(&self, identifier: Identifier) -> Vec<Uuid>;

    fn apply_object_create(&self, event_uuid: Uuid, object: Object);
    fn apply_object_update(&self, event_uuid: Uuid, object: Object);
    fn apply_object_delete(&self, event_uuid: Uuid, identifier: Identifier);
    fn apply_annotation_create(
        &self,
        event_uuid: Uuid,
        object_identifiers: Vec<Identifier>,
        annotation: Annotation,
    );
    fn apply_annotation_update(&self, event_uuid: Uuid, annotation: Annotation);
    fn apply_annotation_delete(&self, event_uuid: Uuid, identifier: Identifier);
    fn apply_review(&self, event_uuid: Uuid, target: Uuid, accepted: bool);
    fn apply_owner_add(&self, owner: String);
    fn apply_owner_remove(&self, owner: &str);
    fn record_event(&self, event_uuid: Uuid, kind: &str, related: &[Identifier]);

    fn object(&self, identifier: Identifier) -> Option<Object>;
    fn annotation(&self, identifier: Identifier) -> Option<Annotation>;
    fn objects_all(&self, after: Option<Uuid>) -> Page<ObjectInfo>;
    fn annotations_all(&self, after: Option<Uuid>) -> Page<AnnotationInfo>;
    fn schemas_all(&self, after: Option<Uuid>) -> Page<SchemaInfo>;
    fn events_all(&self, after: Option<Uuid>) -> Page<EventInfo>;
    fn events_for(&self, identifier: Identifier) -> Vec<EventInfo>;
    fn objects_by_status(&self, status: StatusFilter, after: Option<Identifier>) -> Page<Identifier, Identifier>;
    fn annotations_by_status(
        &self,
        status: StatusFilter,
        after: Option<Identifier>,
    ) -> Page<Identifier, Identifier>;
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<Uuid, Vec<Object>>,
    annotations: BTreeMap<Uuid, Vec<Annotation>>,
    schema_name_to_uuid: HashMap<String, Uuid>,
    schema_uuid_to_name: BTreeMap<Uuid, String>,
    statuses: HashMap<Identifier, EntityStatus>,
    pending_events: HashSet<Uuid>,
    pending_event_targets: HashMap<Uuid, (Identifier, PendingKind)>,
    event_review_link: HashMap<Uuid, (Uuid, bool)>,
    object_annotation_link: HashMap<Identifier, HashSet<Uuid>>,
    annotation_object_link: HashMap<Uuid, HashSet<Identifier>>,
    owners: Vec<String>,
    hash_index: HashMap<String, Uuid>,
    events_in_order: Vec<Uuid>,
    event_summaries: HashMap<Uuid, EventInfo>,
    entity_events: HashMap<Identifier, Vec<Uuid>>,
}

/// In-memory `State` projection over every index named in §4.5.
#[derive(Debug, Default)]
pub struct MemState {
    inner: Mutex<Inner>,
}

impl MemState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State for MemState {
    fn object_versions(&self, uuid: Uuid) -> Vec<Object> {
        self.inner.lock().unwrap().objects.get(&uuid).cloned().unwrap_or_default()
    }

    fn annotation_versions(&self, uuid: Uuid) -> Vec<Annotation> {
        self.inner.lock().unwrap().annotations.get(&uuid).cloned().unwrap_or_default()
    }

    fn schema_uuid_by_name(&self, name: &str) -> Option<Uuid> {
        self.inner.lock().unwrap().schema_name_to_uuid.get(name).copied()
    }

    fn schema_name_by_uuid(&self, uuid: Uuid) -> Option<String> {
        self.inner.lock().unwrap().schema_uuid_to_name.get(&uuid).cloned()
    }

    fn entity_status(&self, identifier: Identifier) -> EntityStatus {
        self.inner.lock().unwrap().statuses.get(&identifier).cloned().unwrap_or_default()
    }

    fn is_pending(&self, event_uuid: Uuid) -> bool {
        self.inner.lock().unwrap().pending_events.contains(&event_uuid)
    }

    fn review_link(&self, target: Uuid) -> Option<(Uuid, bool)> {
        self.inner.lock().unwrap().event_review_link.get(&target).copied()
    }

    fn hash_owner(&self, hash: &str) -> Option<Uuid> {
        self.inner.lock().unwrap().hash_index.get(hash).copied()
    }

    fn owners(&self) -> Vec<String> {
        self.inner.lock().unwrap().owners.clone()
    }

    fn owner_rank(&self, owner: &str) -> Option<usize> {
        self.inner.lock().unwrap().owners.iter().position(|candidate| candidate == owner)
    }

    fn object_identifiers_for_annotation(&self, uuid: Uuid) -> Vec<Identifier> {
        self.inner
            .lock()
            .unwrap()
            .annotation_object_link
            .get(&uuid)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn annotation_uuids_for_object(&self, identifier: Identifier) -> Vec<Uuid> {
        self.inner
            .lock()
            .unwrap()
            .object_annotation_link
            .get(&identifier)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn apply_object_create(&self, event_uuid: Uuid, object: Object) {
        let mut inner = self.inner.lock().unwrap();
        let identifier = object.identifier();
        if object.is_schema_object() {
            inner.schema_name_to_uuid.insert(object.name.clone(), object.uuid);
            inner.schema_uuid_to_name.insert(object.uuid, object.name.clone());
        }
        inner.hash_index.insert(object.hash.clone(), object.uuid);
        inner.objects.entry(object.uuid).or_default().push(object);
        inner.statuses.entry(identifier).or_default().insert(StatusT::CreatePending);
        inner.pending_events.insert(event_uuid);
        inner.pending_event_targets.insert(event_uuid, (identifier, PendingKind::CreateOrUpdate));
    }

    fn apply_object_update(&self, event_uuid: Uuid, object: Object) {
        // Same projection shape as create; version counting already
        // guaranteed by the validator, so the list position is the version.
        self.apply_object_create(event_uuid, object);
    }

    fn apply_object_delete(&self, event_uuid: Uuid, identifier: Identifier) {
        let mut inner = self.inner.lock().unwrap();
        inner.statuses.entry(identifier).or_default().insert(StatusT::DeletePending);
        inner.pending_events.insert(event_uuid);
        inner.pending_event_targets.insert(event_uuid, (identifier, PendingKind::Delete));
        // entity_events membership for this event is recorded once, by
        // `record_event`, from the `related` list `Machine::consume` builds.
    }

    fn apply_annotation_create(
        &self,
        event_uuid: Uuid,
        object_identifiers: Vec<Identifier>,
        annotation: Annotation,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let identifier = annotation.identifier();
        for object_identifier in &object_identifiers {
            inner.object_annotation_link.entry(*object_identifier).or_default().insert(annotation.uuid);
            inner.annotation_object_link.entry(annotation.uuid).or_default().insert(*object_identifier);
        }
        inner.annotations.entry(annotation.uuid).or_default().push(annotation);
        inner.statuses.entry(identifier).or_default().insert(StatusT::CreatePending);
        inner.pending_events.insert(event_uuid);
        inner.pending_event_targets.insert(event_uuid, (identifier, PendingKind::CreateOrUpdate));
        // entity_events membership for this event is recorded once, by
        // `record_event`, from the `related` list `Machine::consume` builds.
    }

    fn apply_annotation_update(&self, event_uuid: Uuid, annotation: Annotation) {
        let mut inner = self.inner.lock().unwrap();
        let identifier = annotation.identifier();
        inner.annotations.entry(annotation.uuid).or_default().push(annotation);
        inner.statuses.entry(identifier).or_default().insert(StatusT::CreatePending);
        inner.pending_events.insert(event_uuid);
        inner.pending_event_targets.insert(event_uuid, (identifier, PendingKind::CreateOrUpdate));
    }

    fn apply_annotation_delete(&self, event_uuid: Uuid, identifier: Identifier) {
        self.apply_object_delete(event_uuid, identifier);
    }

    fn apply_review(&self, event_uuid: Uuid, target: Uuid, accepted: bool) {
        let mut inner = self.inner.lock().unwrap();
        let (identifier, kind) = inner
            .pending_event_targets
            .remove(&target)
            .expect("reviewed event must have a recorded pending target");
        inner.pending_events.remove(&target);
        inner.event_review_link.insert(target, (event_uuid, accepted));
        let status = inner.statuses.entry(identifier).or_default();
        match (kind, accepted) {
            (PendingKind::CreateOrUpdate, true) => status.remove(StatusT::CreatePending),
            (PendingKind::CreateOrUpdate, false) => {
                status.remove(StatusT::CreatePending);
                status.insert(StatusT::CreateRejected);
            }
            (PendingKind::Delete, true) => {
                status.remove(StatusT::DeletePending);
                status.insert(StatusT::DeleteAccepted);
            }
            (PendingKind::Delete, false) => status.remove(StatusT::DeletePending),
        }
        inner.entity_events.entry(identifier).or_default().push(event_uuid);
    }

    fn apply_owner_add(&self, owner: String) {
        self.inner.lock().unwrap().owners.push(owner);
    }

    fn apply_owner_remove(&self, owner: &str) {
        self.inner.lock().unwrap().owners.retain(|candidate| candidate != owner);
    }

    fn record_event(&self, event_uuid: Uuid, kind: &str, related: &[Identifier]) {
        let mut inner = self.inner.lock().unwrap();
        inner.events_in_order.push(event_uuid);
        inner.event_summaries.insert(
            event_uuid,
            EventInfo { uuid: event_uuid, kind: kind.to_string(), review: None },
        );
        for identifier in related {
            inner.entity_events.entry(*identifier).or_default().push(event_uuid);
        }
    }

    fn object(&self, identifier: Identifier) -> Option<Object> {
        let inner = self.inner.lock().unwrap();
        inner.objects.get(&identifier.uuid)?.get(identifier.version as usize).cloned()
    }

    fn annotation(&self, identifier: Identifier) -> Option<Annotation> {
        let inner = self.inner.lock().unwrap();
        inner.annotations.get(&identifier.uuid)?.get(identifier.version as usize).cloned()
    }

    fn objects_all(&self, after: Option<Uuid>) -> Page<ObjectInfo> {
        let inner = self.inner.lock().unwrap();
        let ordered: BTreeMap<Uuid, ObjectInfo> = inner
            .objects
            .iter()
            .map(|(uuid, versions)| (*uuid, ObjectInfo { uuid: *uuid, versions: versions.len() as u64 }))
            .collect();
        paginate(&ordered, after)
    }

    fn annotations_all(&self, after: Option<Uuid>) -> Page<AnnotationInfo> {
        let inner = self.inner.lock().unwrap();
        let ordered: BTreeMap<Uuid, AnnotationInfo> = inner
            .annotations
            .iter()
            .map(|(uuid, versions)| (*uuid, AnnotationInfo { uuid: *uuid, versions: versions.len() as u64 }))
            .collect();
        paginate(&ordered, after)
    }

    fn schemas_all(&self, after: Option<Uuid>) -> Page<SchemaInfo> {
        let inner = self.inner.lock().unwrap();
        let ordered: BTreeMap<Uuid, SchemaInfo> = inner
            .schema_uuid_to_name
            .iter()
            .map(|(uuid, name)| {
                let versions = inner.objects.get(uuid).map(|v| v.len()).unwrap_or(0) as u64;
                (*uuid, SchemaInfo { name: name.clone(), uuid: *uuid, versions })
            })
            .collect();
        paginate(&ordered, after)
    }

    fn events_all(&self, after: Option<Uuid>) -> Page<EventInfo> {
        let inner = self.inner.lock().unwrap();
        let start = match after {
            Some(cursor) => match inner.events_in_order.iter().position(|uuid| *uuid == cursor) {
                Some(index) => index + 1,
                None => return Page::default(),
            },
            None => 0,
        };
        let slice = &inner.events_in_order[start.min(inner.events_in_order.len())..];
        // Fetch one past the page so its presence signals more pages exist,
        // but the cursor handed back is the last entry actually returned —
        // see `paginate`'s comment for why the boundary entry must not be
        // the cursor itself.
        let mut uuids: Vec<Uuid> = slice.iter().take(PAGE_SIZE + 1).copied().collect();
        let next = if uuids.len() > PAGE_SIZE {
            uuids.pop();
            uuids.last().copied()
        } else {
            None
        };
        let items: Vec<EventInfo> = uuids
            .iter()
            .map(|uuid| {
                let mut summary = inner.event_summaries.get(uuid).cloned().unwrap_or(EventInfo {
                    uuid: *uuid,
                    kind: "Unknown".to_string(),
                    review: None,
                });
                summary.review = inner.event_review_link.get(uuid).copied();
                summary
            })
            .collect();
        Page { items, next }
    }

    fn events_for(&self, identifier: Identifier) -> Vec<EventInfo> {
        let inner = self.inner.lock().unwrap();
        inner
            .entity_events
            .get(&identifier)
            .map(|uuids| {
                uuids
                    .iter()
                    .map(|uuid| {
                        let mut summary = inner.event_summaries.get(uuid).cloned().unwrap_or(EventInfo {
                            uuid: *uuid,
                            kind: "Unknown".to_string(),
                            review: None,
                        });
                        summary.review = inner.event_review_link.get(uuid).copied();
                        summary
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn objects_by_status(&self, status: StatusFilter, after: Option<Identifier>) -> Page<Identifier, Identifier> {
        let inner = self.inner.lock().unwrap();
        let matches = status_filter_matches(status, inner.objects.keys().map(|uuid| {
            (*uuid, inner.objects[uuid].len() as u64)
        }), &inner.statuses);
        paginate(&matches, after)
    }

    fn annotations_by_status(
        &self,
        status: StatusFilter,
        after: Option<Identifier>,
    ) -> Page<Identifier, Identifier> {
        let inner = self.inner.lock().unwrap();
        let matches = status_filter_matches(status, inner.annotations.keys().map(|uuid| {
            (*uuid, inner.annotations[uuid].len() as u64)
        }), &inner.statuses);
        paginate(&matches, after)
    }
}

/// Shared scan over every version of every entity in `counts` (uuid ->
/// version count), bucketing identifiers into the requested `StatusFilter`.
fn status_filter_matches(
    status: StatusFilter,
    counts: impl Iterator<Item = (Uuid, u64)>,
    statuses: &HashMap<Identifier, EntityStatus>,
) -> BTreeMap<Identifier, Identifier> {
    let mut matches = BTreeMap::new();
    for (uuid, version_count) in counts {
        if version_count == 0 {
            continue;
        }
        let tail_version = version_count - 1;
        for version in 0..version_count {
            let identifier = Identifier::new(uuid, version);
            let entity_status = statuses.get(&identifier).cloned().unwrap_or_default();
            let is_match = match status {
                StatusFilter::Pending => {
                    entity_status.contains(StatusT::CreatePending) || entity_status.contains(StatusT::DeletePending)
                }
                StatusFilter::Rejected => entity_status.contains(StatusT::CreateRejected),
                StatusFilter::Deleted => entity_status.contains(StatusT::DeleteAccepted),
                StatusFilter::Accepted => entity_status.is_empty() && version == tail_version,
                StatusFilter::Deprecated => entity_status.is_empty() && version != tail_version,
            };
            if is_match {
                matches.insert(identifier, identifier);
            }
        }
    }
    matches
}
