// Branch prediction hints. The intrinsics are nightly-only; these stable
// shims keep the hot call sites annotated.
#[inline]
pub(crate) fn likely(b: bool) -> bool {
    b
}

#[inline]
pub(crate) fn unlikely(b: bool) -> bool {
    b
}
