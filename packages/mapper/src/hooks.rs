//! Lifecycle hooks.

use crate::{Error, Object};

/// Extension points around `save` and `delete`.
///
/// Every hook defaults to a no-op. An error returned from a hook propagates
/// to the caller unchanged and aborts the rest of the operation: a failing
/// `pre_save` stores nothing, a failing `pre_delete` leaves the record in
/// place.
///
/// # Example
///
/// ```rust
/// use kvmapper::{Error, Hooks, Object};
///
/// struct ShoutingNames;
///
/// impl Hooks for ShoutingNames {
///     fn pre_save(&self, object: &mut Object) -> Result<(), Error> {
///         let upper = object.get("first_name")?.to_text().to_uppercase();
///         object.set("first_name", upper);
///         Ok(())
///     }
/// }
/// ```
pub trait Hooks: Send + Sync {
    /// Before cleaning and storing.
    fn pre_save(&self, _object: &mut Object) -> Result<(), Error> {
        Ok(())
    }

    /// After the record is stored and the key adopted.
    fn post_save(&self, _object: &mut Object) -> Result<(), Error> {
        Ok(())
    }

    /// Before the record is removed.
    fn pre_delete(&self, _object: &mut Object) -> Result<(), Error> {
        Ok(())
    }

    /// After the record is removed.
    fn post_delete(&self, _object: &mut Object) -> Result<(), Error> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl Hooks for NoHooks {}
