//! Present-versus-absent field wrapper for partial updates.

use serde::{Deserialize, Deserializer};

/// A field of a partial-update payload.
///
/// `Option<T>` cannot tell "key missing" from "key present with an empty or
/// null value". Relation lists need that distinction: a missing `tags` key
/// keeps the existing associations while `"tags": []` clears them.
///
/// Use with `#[serde(default)]` so a missing key deserializes to
/// [`Patch::Unset`]:
///
/// ```
/// use recipe_catalog_core::Patch;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Changes {
///     #[serde(default)]
///     tags: Patch<Vec<String>>,
/// }
///
/// let absent: Changes = serde_json::from_str("{}").unwrap();
/// assert!(absent.tags.is_unset());
///
/// let cleared: Changes = serde_json::from_str(r#"{"tags": []}"#).unwrap();
/// assert_eq!(cleared.tags, Patch::Set(vec![]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// The key was not supplied; keep the stored value.
    #[default]
    Unset,
    /// The key was supplied; replace the stored value.
    Set(T),
}

impl<T> Patch<T> {
    /// Returns `true` if the key was not supplied.
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Converts into an `Option`, losing nothing but the name.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value),
        }
    }

    /// Map the supplied value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Self::Unset => Patch::Unset,
            Self::Set(value) => Patch::Set(f(value)),
        }
    }

    /// Returns the supplied value or `current`.
    pub fn unwrap_or(self, current: T) -> T {
        match self {
            Self::Unset => current,
            Self::Set(value) => value,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Self::Set)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        names: Patch<Vec<String>>,
        #[serde(default)]
        note: Patch<Option<String>>,
    }

    #[test]
    fn test_missing_key_is_unset() {
        let payload: Payload = serde_json::from_str("{}").unwrap();
        assert!(payload.names.is_unset());
        assert!(payload.note.is_unset());
    }

    #[test]
    fn test_empty_list_is_set() {
        let payload: Payload = serde_json::from_str(r#"{"names": []}"#).unwrap();
        assert_eq!(payload.names, Patch::Set(Vec::new()));
    }

    #[test]
    fn test_null_on_optional_field_clears() {
        let payload: Payload = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(payload.note, Patch::Set(None));
    }

    #[test]
    fn test_null_on_list_is_rejected() {
        assert!(serde_json::from_str::<Payload>(r#"{"names": null}"#).is_err());
    }

    #[test]
    fn test_unwrap_or_prefers_supplied_value() {
        assert_eq!(Patch::Set(2).unwrap_or(1), 2);
        assert_eq!(Patch::<i32>::Unset.unwrap_or(1), 1);
    }

    #[test]
    fn test_map_and_into_option() {
        assert_eq!(Patch::Set(2).map(|v| v * 10).into_option(), Some(20));
        assert_eq!(Patch::<i32>::Unset.map(|v| v * 10).into_option(), None);
        assert_eq!(Patch::from(Some("x")), Patch::Set("x"));
    }
}
