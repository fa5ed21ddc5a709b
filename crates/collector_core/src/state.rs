use crate::view_model::CollectorView;
use crate::{ClassifiedMessage, PackageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectorPhase {
    #[default]
    Idle,
    Collecting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPackage {
    pub id: PackageId,
    pub name: String,
}

/// Lifecycle state of the collector.
///
/// `scratch` is only ever non-empty while a package is open.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorState {
    open: Option<OpenPackage>,
    scratch: Vec<ClassifiedMessage>,
    next_seq: u64,
}

impl Default for CollectorState {
    fn default() -> Self {
        Self {
            open: None,
            scratch: Vec::new(),
            next_seq: 1,
        }
    }
}

impl CollectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CollectorPhase {
        if self.open.is_some() {
            CollectorPhase::Collecting
        } else {
            CollectorPhase::Idle
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.phase() == CollectorPhase::Collecting
    }

    pub fn open_package(&self) -> Option<&OpenPackage> {
        self.open.as_ref()
    }

    pub fn scratch(&self) -> &[ClassifiedMessage] {
        &self.scratch
    }

    pub fn view(&self) -> CollectorView {
        CollectorView {
            phase: self.phase(),
            open_package: self.open.as_ref().map(|open| open.id),
            open_name: self.open.as_ref().map(|open| open.name.clone()),
            scratch_len: self.scratch.len(),
        }
    }

    pub(crate) fn open(&mut self, name: String) -> PackageId {
        let id = PackageId::new(self.next_seq);
        self.next_seq += 1;
        self.open = Some(OpenPackage { id, name });
        self.scratch.clear();
        id
    }

    /// Appends to scratch and returns the open id with a copy of the list.
    pub(crate) fn push_item(
        &mut self,
        message: ClassifiedMessage,
    ) -> Option<(PackageId, Vec<ClassifiedMessage>)> {
        let id = self.open.as_ref()?.id;
        self.scratch.push(message);
        Some((id, self.scratch.clone()))
    }

    /// Closes the open package, handing back its id and final items.
    pub(crate) fn close(&mut self) -> Option<(PackageId, Vec<ClassifiedMessage>)> {
        let open = self.open.take()?;
        Some((open.id, std::mem::take(&mut self.scratch)))
    }

    pub(crate) fn abandon(&mut self) {
        self.open = None;
        self.scratch.clear();
    }

    pub(crate) fn restore_allocator(&mut self, last_id: Option<PackageId>) {
        if let Some(last) = last_id {
            self.next_seq = self.next_seq.max(last.seq() + 1);
        }
    }
}
