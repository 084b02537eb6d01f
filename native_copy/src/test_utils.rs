//! Helpers for tests, used by this crate's unit and integration tests.

use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FileSpan {
    pub file: &'static str,
    pub line: u32,
}

pub type ThreadError = Box<dyn Any + Send + 'static>;

#[derive(Debug, Clone)]
pub struct ShouldHavePanickedAt {
    pub span: FileSpan,
}

#[macro_export]
#[doc(hidden)]
macro_rules! file_span {
    () => {{
        use $crate::test_utils::FileSpan;
        FileSpan {
            file: file!(),
            line: line!(),
        }
    }};
}

/// Runs `f`, returning the panic payload, or an error if it didn't panic.
pub fn must_panic<F, R>(span: FileSpan, f: F) -> Result<ThreadError, ShouldHavePanickedAt>
where
    F: FnOnce() -> R,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(_) => Err(ShouldHavePanickedAt { span }),
        Err(e) => Ok(e),
    }
}

/// The message of a panic payload, if it was a string.
pub fn panic_message(payload: &ThreadError) -> Option<&str> {
    payload
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| payload.downcast_ref::<&'static str>().copied())
}

#[test]
fn test_must_panic() {
    assert!(must_panic(file_span!(), || panic!()).is_ok());
    assert!(must_panic(file_span!(), || ()).is_err());

    let payload = must_panic(file_span!(), || panic!("{}", 10)).unwrap();
    assert_eq!(panic_message(&payload), Some("10"));
}
