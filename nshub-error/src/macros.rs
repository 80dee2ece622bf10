/// Returns `Err(StackError)` from the current function.
///
/// Listeners use it to report a failure to the registry's error hooks.
/// Three forms:
/// - `bail!(err)`: any error convertible into `StackError`;
/// - `bail!(code, "msg")`: builds a `GenericError` from a code and message;
/// - `bail!(code, "fmt {}", arg)`: formatted message.
///
/// ```ignore
/// use nshub_error::{bail, StatusCode};
///
/// fn on_deploy(args: &[serde_json::Value]) -> nshub_error::HubResult<()> {
///     if args.is_empty() {
///         bail!(StatusCode::InvalidArgs, "deploy needs a target");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $msg:expr) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, $msg)
        ))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, format!($fmt, $($arg)*))
        ))
    };
}

/// Adds `.context(...)` to any `Result` whose error converts into
/// [`StackError`](crate::StackError).
pub trait ResultExt<T> {
    /// Wraps the error into `StackError` and appends `ctx`.
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<crate::StackError>,
{
    #[track_caller]
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.into().context(ctx))
    }
}
