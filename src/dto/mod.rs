use serde::{Serialize, Serializer, ser::SerializeMap};

pub mod health;
pub mod profile;
pub mod profile_update;
pub mod validation;

/// Serialize `None` as `{}` so single-row sections are never `null`.
fn or_empty_object<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}
