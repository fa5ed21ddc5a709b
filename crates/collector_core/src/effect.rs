use crate::{ClassifiedMessage, PackageId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Create the package, replacing any existing package with the same name.
    OpenPackage {
        id: PackageId,
        name: String,
        created_at: i64,
    },
    /// The scratch list grew; mirror it into the open package and notify.
    ItemsAppended {
        id: PackageId,
        items: Vec<ClassifiedMessage>,
    },
    /// Copy the final scratch list into the package and mark it complete.
    FinalizePackage {
        id: PackageId,
        items: Vec<ClassifiedMessage>,
    },
    /// A non-control message arrived while idle and was dropped.
    Discarded { message: ClassifiedMessage },
}
