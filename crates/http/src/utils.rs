//! Internal helper macros.

/// Early-returns `Err($error)` when the predicate does not hold.
///
/// Reads like `assert!`, but fails the surrounding function instead of
/// panicking, which keeps wire-facing validation on the error path.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
