//! Data models for the colis backend.
//!
//! These types only describe what travels over the wire:
//!
//! - `Colis`, `ColisRequest`: packages and their lifecycle status
//! - `Zone`, `ZoneRequest`, `Livreur`: delivery zones and couriers
//! - `User`, `Role`, `Permission`: accounts and role assignments
//! - `AuthResponse`, `LoginCredentials`: login exchange
//! - `PageResponse`, `PaginationParams`: paged listings

pub mod colis;
pub mod page;
pub mod user;
pub mod zone;

use serde::{Deserialize, Deserializer};

pub use colis::{Colis, ColisRequest, EntityRef, Priority, Statut};
pub use page::{PageResponse, PaginationParams, SortDirection};
pub use user::{AuthResponse, LoginCredentials, Permission, Provider, Role, User, UserRole};
pub use zone::{Livreur, Zone, ZoneRequest};

/// Read an explicit `null` as the field's default, like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
