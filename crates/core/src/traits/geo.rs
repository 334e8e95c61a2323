//! Geocoding provider trait

use async_trait::async_trait;

use crate::error::Result;
use crate::language::Language;
use crate::location::{LocationKind, ResolvedAddress};

/// Address text to coordinate resolution
///
/// `None` means the backend found nothing usable for this field: either no
/// result at all, a precision below the field's gate, or a coordinate
/// outside the exchange's bounding box. The collection loop re-prompts on
/// `None`; it does not distinguish the three causes.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(
        &self,
        query: &str,
        kind: LocationKind,
        language: Language,
    ) -> Result<Option<ResolvedAddress>>;
}
