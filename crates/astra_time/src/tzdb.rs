//! Timezone database seam.
//!
//! Name resolution is served by the bundled IANA database (`chrono-tz`).
//! Coordinate-to-zone lookup is a collaborator concern: the builtin resolver
//! declines it, and deployments that enable derivation plug in their own
//! implementation.

use chrono_tz::Tz;

/// IANA name resolution plus optional coordinate-to-zone lookup.
pub trait TimezoneDatabase: Send + Sync {
    /// Resolve an IANA zone name, `None` when unknown.
    fn resolve(&self, name: &str) -> Option<Tz>;

    /// Derive an IANA zone name from coordinates, `None` when unsupported.
    fn zone_for_coordinates(&self, _lat: f64, _lon: f64) -> Option<String> {
        None
    }
}

/// Resolver over the bundled IANA database.
#[derive(Debug, Default, Clone, Copy)]
pub struct IanaTzDatabase;

impl TimezoneDatabase for IanaTzDatabase {
    fn resolve(&self, name: &str) -> Option<Tz> {
        name.parse::<Tz>().ok()
    }
}
