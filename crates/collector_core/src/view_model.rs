use crate::{CollectorPhase, PackageId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectorView {
    pub phase: CollectorPhase,
    pub open_package: Option<PackageId>,
    pub open_name: Option<String>,
    pub scratch_len: usize,
}
