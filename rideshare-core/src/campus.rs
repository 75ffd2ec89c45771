//! Campus name to coordinate lookup.

use thiserror::Error;

use crate::GeoCoordinate;

/// Raised when a campus name has no registered coordinate.
///
/// The error lists every known campus so callers can report the valid
/// choices back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown campus {name:?}; known campuses: {}", known.join(", "))]
pub struct UnknownCampus {
    /// The campus name that failed to resolve.
    pub name: String,
    /// Registered campus names in registration order.
    pub known: Vec<String>,
}

/// Ordered, case-sensitive mapping from campus name to coordinate.
///
/// # Examples
///
/// ```
/// use rideshare_core::CampusRegistry;
///
/// let registry = CampusRegistry::default();
/// let main = registry.resolve("Main Campus").expect("known campus");
/// assert_eq!(main.lat, 49.2606);
/// assert!(registry.resolve("main campus").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CampusRegistry {
    entries: Vec<(String, GeoCoordinate)>,
}

impl Default for CampusRegistry {
    fn default() -> Self {
        Self::from_entries([
            ("Main Campus", GeoCoordinate::new(49.2606, -123.2460)),
            ("UBC Campus", GeoCoordinate::new(49.2606, -123.2460)),
            ("North Campus", GeoCoordinate::new(49.3050, -123.1440)),
        ])
    }
}

impl CampusRegistry {
    /// Build a registry from `(name, coordinate)` pairs.
    ///
    /// A repeated name replaces the earlier coordinate but keeps its original
    /// position.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, GeoCoordinate)>,
        S: Into<String>,
    {
        let mut registry = Self {
            entries: Vec::new(),
        };
        for (name, coordinate) in entries {
            registry.insert(name, coordinate);
        }
        registry
    }

    /// Register or replace a campus.
    pub fn insert(&mut self, name: impl Into<String>, coordinate: GeoCoordinate) {
        let name = name.into();
        match self.entries.iter_mut().find(|(known, _)| *known == name) {
            Some(entry) => entry.1 = coordinate,
            None => self.entries.push((name, coordinate)),
        }
    }

    /// Look up the coordinate registered for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCampus`] when `name` is not registered. Matching is
    /// exact and case-sensitive.
    pub fn resolve(&self, name: &str) -> Result<GeoCoordinate, UnknownCampus> {
        self.entries
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, coordinate)| *coordinate)
            .ok_or_else(|| UnknownCampus {
                name: name.to_owned(),
                known: self.names().map(str::to_owned).collect(),
            })
    }

    /// Registered campus names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered campuses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Main Campus", 49.2606)]
    #[case("UBC Campus", 49.2606)]
    #[case("North Campus", 49.3050)]
    fn resolves_default_campuses(#[case] name: &str, #[case] lat: f64) {
        let coordinate = CampusRegistry::default().resolve(name).expect("known");
        assert!((coordinate.lat - lat).abs() < f64::EPSILON);
    }

    #[rstest]
    fn unknown_campus_lists_known_names() {
        let err = CampusRegistry::default()
            .resolve("Nowhere U")
            .expect_err("unknown");
        assert_eq!(err.name, "Nowhere U");
        assert_eq!(err.known, ["Main Campus", "UBC Campus", "North Campus"]);
        assert!(err.to_string().contains("Main Campus, UBC Campus, North Campus"));
    }

    #[rstest]
    fn lookup_is_case_sensitive() {
        assert!(CampusRegistry::default().resolve("north campus").is_err());
    }

    #[rstest]
    fn insert_replaces_without_reordering() {
        let mut registry = CampusRegistry::default();
        registry.insert("Main Campus", GeoCoordinate::new(1.0, 2.0));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names().next(), Some("Main Campus"));
        let main = registry.resolve("Main Campus").expect("known");
        assert_eq!(main, GeoCoordinate::new(1.0, 2.0));
    }
}
