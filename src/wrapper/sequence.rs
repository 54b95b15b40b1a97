use crate::{
    classify::{classify, Class},
    deferred::Deferred,
    value::{realize, Value},
    wrap::Wrapped,
};

use super::{ContainerWrapper, DeferredWrapper};

/// Scans a sequence for pending elements.
///
/// Without pending elements the sequence is treated as a container. Otherwise its
/// elements are joined into one pending value settling to the array of their
/// settlements, in input order. The sequence is realized once, so single-pass
/// iterators are read exactly once for both the scan and the join.
pub(crate) fn aggregate(sequence: Value) -> Wrapped {
    let items = match realize(&sequence) {
        Ok(Some(items)) => items,
        Ok(None) => return Wrapped::Container(ContainerWrapper::new(sequence)),
        Err(error) => {
            return Wrapped::Deferred(DeferredWrapper::from_handle(Deferred::failed(error)))
        }
    };

    let pending = items
        .iter()
        .filter(|item| classify(item) == Class::Deferred)
        .count();
    if pending == 0 {
        return Wrapped::Container(ContainerWrapper::new(sequence));
    }

    tracing::trace!(len = items.len(), pending, "joining sequence");
    Wrapped::Deferred(DeferredWrapper::from_handle(Deferred::all(
        items.iter().cloned(),
    )))
}
