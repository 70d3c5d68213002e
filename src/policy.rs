//! Which types and members get documented.

use crate::metadata::{MemberDescriptor, Metadata, TypeDescriptor};

/// Filter the metadata universe in place.
///
/// By default only public (and protected) symbols are kept; `show_nonpublic`
/// keeps everything. Compiler-generated backing fields are always removed.
/// `filters` select namespaces: `Acme.Io` keeps that namespace and those
/// nested in it, `!Acme.Internal` drops them.
pub fn apply(metadata: &mut Metadata, show_nonpublic: bool, filters: &[String]) {
    metadata.retain(
        |ty| keep_type(ty, show_nonpublic, filters),
        |member| keep_member(member, show_nonpublic),
    );
}

fn keep_type(ty: &TypeDescriptor, show_nonpublic: bool, filters: &[String]) -> bool {
    if !show_nonpublic && !ty.visibility.is_public() {
        return false;
    }

    let mut inclusions = filters.iter().filter(|f| !f.starts_with('!')).peekable();
    if inclusions.peek().is_some() && !inclusions.any(|f| in_namespace(&ty.namespace, f)) {
        return false;
    }

    !filters
        .iter()
        .filter_map(|f| f.strip_prefix('!'))
        .any(|excluded| in_namespace(&ty.namespace, excluded))
}

fn keep_member(member: &MemberDescriptor, show_nonpublic: bool) -> bool {
    if member.is_backing_field() {
        return false;
    }
    show_nonpublic || member.visibility.is_public()
}

/// `Acme.Io` is in `Acme` and in `Acme.Io`, but not in `Acme.I`.
fn in_namespace(namespace: &str, filter: &str) -> bool {
    namespace == filter
        || namespace
            .strip_prefix(filter)
            .is_some_and(|rest| rest.starts_with('.'))
}
