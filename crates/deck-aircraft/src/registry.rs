//! Aircraft registry and runtime matcher.
//!
//! The registry is populated once at startup from built-in profiles and
//! any extension directories, then queried on every aircraft-change
//! report. Matching requires an exact `(icao, author)` registration; a
//! miss means no aircraft is bound, which the coordinator surfaces as the
//! unbound fallback state.

use crate::identity::AircraftIdentity;
use crate::profile::{AircraftProfile, ProfileError};
use crate::variant::{ValueSamples, resolve_variant};
use flight_deck_core::{MappingLayer, SubscriptionSet};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const BUILTIN_PROFILES: &[&str] = &[
    include_str!("builtin/toliss_airbus.yaml"),
    include_str!("builtin/laminar_airbus.yaml"),
];

/// The outcome of matching the simulator's loaded aircraft: a profile and
/// the variant its resolver selected, if any.
#[derive(Debug, Clone)]
pub struct ResolvedAircraft {
    pub identity: AircraftIdentity,
    pub profile: Arc<AircraftProfile>,
    pub variant: Option<String>,
}

impl ResolvedAircraft {
    /// Base mapping layer of the bound profile.
    pub fn base_layer(&self) -> MappingLayer {
        self.profile.base_layer()
    }

    /// Overlay layer for the selected variant, when one is selected and
    /// the profile declares a matching overlay.
    pub fn overlay_layer(&self) -> Option<MappingLayer> {
        self.variant
            .as_deref()
            .and_then(|v| self.profile.variant_layer(v))
    }

    /// Simulator subscriptions this binding needs.
    pub fn subscriptions(&self) -> SubscriptionSet {
        self.profile.subscriptions(self.variant.as_deref())
    }
}

/// All registered aircraft profiles, keyed by identity.
#[derive(Debug, Default)]
pub struct AircraftRegistry {
    by_identity: HashMap<String, Arc<AircraftProfile>>,
}

impl AircraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the shipped aircraft profiles.
    ///
    /// # Panics
    /// Never at runtime: the embedded profiles are covered by tests.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for source in BUILTIN_PROFILES {
            match AircraftProfile::from_yaml(source) {
                Ok(profile) => registry.register(profile),
                Err(err) => warn!(error = %err, "skipping malformed built-in aircraft profile"),
            }
        }
        registry
    }

    /// Register a profile for every identity it declares. A later
    /// registration of the same identity replaces the earlier one, so
    /// extension profiles can override built-ins.
    pub fn register(&mut self, profile: AircraftProfile) {
        let profile = Arc::new(profile);
        for identity in &profile.aircraft {
            let key = identity.key();
            if self.by_identity.contains_key(&key) {
                info!(aircraft = %key, profile = %profile.name, "replacing aircraft registration");
            }
            self.by_identity.insert(key, Arc::clone(&profile));
        }
    }

    /// Scan a flat extension directory for `*.yaml`/`*.yml` profile
    /// documents. Malformed files are skipped with a warning; missing or
    /// unreadable directories are reported but never fatal.
    pub fn load_extension_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "cannot read extension directory");
                return;
            }
        };

        let mut loaded = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
            if !is_yaml {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(ProfileError::from)
                .and_then(|source| AircraftProfile::from_yaml(&source))
            {
                Ok(profile) => {
                    debug!(path = %path.display(), profile = %profile.name, "loaded extension aircraft profile");
                    self.register(profile);
                    loaded += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping malformed aircraft profile");
                }
            }
        }
        info!(dir = %dir.display(), loaded, "scanned extension directory");
    }

    /// Resolve the simulator's loaded aircraft. Returns `None` when no
    /// profile is registered for the exact identity. Variant resolution
    /// is applied when the matched profile declares a resolver; any
    /// resolver failure falls back to the base configuration.
    pub fn resolve(&self, icao: &str, author: &str, samples: &ValueSamples) -> Option<ResolvedAircraft> {
        let identity = AircraftIdentity::new(icao, author);
        let profile = self.by_identity.get(&identity.key())?;

        let variant = if profile.has_variant_resolver() {
            resolve_variant(&profile.variant_rules, samples).inspect(|v| {
                if !profile.variants.contains_key(v) {
                    // The variant string still refines the identity even
                    // without overlay mappings.
                    debug!(
                        aircraft = %identity,
                        variant = %v,
                        "resolved variant has no overlay, using base configuration"
                    );
                }
            })
        } else {
            None
        };

        Some(ResolvedAircraft {
            identity,
            profile: Arc::clone(profile),
            variant,
        })
    }

    /// Registered identity keys, sorted.
    pub fn identity_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.by_identity.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Union of every registered profile's variant sample subscriptions.
    /// The coordinator monitors these from startup so samples are on hand
    /// when an aircraft-change report arrives.
    pub fn all_sample_subscriptions(&self) -> SubscriptionSet {
        let mut set = SubscriptionSet::default();
        for profile in self.by_identity.values() {
            set.extend(SubscriptionSet {
                values: profile
                    .variant_samples
                    .iter()
                    .map(|s| flight_deck_core::ValueSubscription::number(s.name.clone()))
                    .collect(),
                commands: Vec::new(),
            });
        }
        set
    }

    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flight_deck_core::Value;

    fn profile_with_variant() -> AircraftProfile {
        AircraftProfile::from_yaml(
            "
name: ToLiss A321neo
aircraft:
  - icao: A21N
    author: ToLiss
variant-samples:
  - name: AirbusFBW/EngineTypeIndex
variant-rules:
  - variant: 272NX
    when:
      - sample: AirbusFBW/EngineTypeIndex
        equals: 2
variants:
  272NX:
    simulator-reports:
      - report-type: simulator-value-change
        simulator-value-name: AirbusFBW/OHPBrightnessLevel
        action: set-device-value
        device-value-name: Backlight
mappings:
  device-reports:
    - report-type: key-press
      key-name: LSK1L
      action: execute-simulator-command
      simulator-command-name: AirbusFBW/MCDU1LSK1L
",
        )
        .unwrap()
    }

    fn samples(engine_type: f64) -> ValueSamples {
        let mut samples = ValueSamples::new();
        samples.insert(
            "AirbusFBW/EngineTypeIndex".to_string(),
            Value::Number(engine_type),
        );
        samples
    }

    #[test]
    fn builtins_load_cleanly() {
        let registry = AircraftRegistry::with_builtins();
        assert!(!registry.is_empty());
        // Every shipped profile must parse; a parse failure would shrink
        // the identity list below the documents' declared identities.
        assert!(registry.identity_keys().len() >= 2);
    }

    #[test]
    fn unregistered_identity_resolves_to_none() {
        let registry = AircraftRegistry::new();
        assert!(registry.resolve("B738", "Alex Unruh", &ValueSamples::new()).is_none());
    }

    #[test]
    fn exact_identity_match_required() {
        let mut registry = AircraftRegistry::new();
        registry.register(profile_with_variant());

        assert!(registry.resolve("A21N", "ToLiss", &ValueSamples::new()).is_some());
        assert!(registry.resolve("A21N", "toliss", &ValueSamples::new()).is_none());
        assert!(registry.resolve("A21n", "ToLiss", &ValueSamples::new()).is_none());
    }

    #[test]
    fn matching_samples_select_the_variant_overlay() {
        let mut registry = AircraftRegistry::new();
        registry.register(profile_with_variant());

        let resolved = registry.resolve("A21N", "ToLiss", &samples(2.0)).unwrap();
        assert_eq!(resolved.variant.as_deref(), Some("272NX"));
        assert!(resolved.overlay_layer().is_some());
    }

    #[test]
    fn non_matching_samples_fall_back_to_base() {
        let mut registry = AircraftRegistry::new();
        registry.register(profile_with_variant());

        let resolved = registry.resolve("A21N", "ToLiss", &samples(7.0)).unwrap();
        assert_eq!(resolved.variant, None);
        assert!(resolved.overlay_layer().is_none());
        assert_eq!(resolved.base_layer().len(), 1);
    }

    #[test]
    fn missing_samples_fall_back_to_base_not_error() {
        let mut registry = AircraftRegistry::new();
        registry.register(profile_with_variant());

        let resolved = registry
            .resolve("A21N", "ToLiss", &ValueSamples::new())
            .unwrap();
        assert_eq!(resolved.variant, None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut registry = AircraftRegistry::new();
        registry.register(profile_with_variant());

        let first = registry.resolve("A21N", "ToLiss", &samples(2.0)).unwrap();
        let second = registry.resolve("A21N", "ToLiss", &samples(2.0)).unwrap();
        assert_eq!(first.variant, second.variant);
        assert_eq!(first.identity, second.identity);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = AircraftRegistry::new();
        registry.register(profile_with_variant());

        let replacement = AircraftProfile::from_yaml(
            "
name: Replacement
aircraft:
  - icao: A21N
    author: ToLiss
",
        )
        .unwrap();
        registry.register(replacement);

        let resolved = registry.resolve("A21N", "ToLiss", &ValueSamples::new()).unwrap();
        assert_eq!(resolved.profile.name, "Replacement");
    }

    #[test]
    fn extension_dir_loads_well_formed_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.yaml"),
            "
name: Custom
aircraft:
  - icao: TEST
    author: Extension Author
",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "name: [unterminated").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a profile").unwrap();

        let mut registry = AircraftRegistry::new();
        registry.load_extension_dir(dir.path());

        assert_eq!(registry.len(), 1);
        assert!(
            registry
                .resolve("TEST", "Extension Author", &ValueSamples::new())
                .is_some()
        );
    }

    #[test]
    fn missing_extension_dir_is_not_fatal() {
        let mut registry = AircraftRegistry::new();
        registry.load_extension_dir(Path::new("/nonexistent/extensions"));
        assert!(registry.is_empty());
    }

    #[test]
    fn sample_subscriptions_cover_registered_resolvers() {
        let mut registry = AircraftRegistry::new();
        registry.register(profile_with_variant());

        let set = registry.all_sample_subscriptions();
        assert_eq!(set.values.len(), 1);
        assert_eq!(set.values[0].name, "AirbusFBW/EngineTypeIndex");
    }
}
