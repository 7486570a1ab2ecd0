//! Aircraft profile documents.

use crate::identity::AircraftIdentity;
use crate::variant::VariantRule;
use flight_deck_core::config::ConfigError;
use flight_deck_core::{MappingDocument, MappingLayer, SubscriptionSet, ValueSubscription};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading an aircraft profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid aircraft profile: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cannot read aircraft profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("aircraft profile `{name}` declares no aircraft identities")]
    NoIdentities { name: String },

    #[error("aircraft profile `{name}`: {source}")]
    Mappings {
        name: String,
        #[source]
        source: ConfigError,
    },

    #[error("aircraft profile `{name}`, variant `{variant}`: {source}")]
    VariantMappings {
        name: String,
        variant: String,
        #[source]
        source: ConfigError,
    },
}

/// Declared subscription to a simulator value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SubscribedValue {
    pub name: String,
    /// `number` (default) or `text`.
    #[serde(default)]
    pub r#type: SubscribedValueType,
    /// Byte length for text values; defaults to 40, the simulator's usual
    /// identity-string width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscribedValueType {
    #[default]
    Number,
    Text,
}

const DEFAULT_TEXT_LEN: usize = 40;

/// One aircraft configuration: identities served, mapping documents, and
/// optional variant overlays with their resolver rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AircraftProfile {
    /// Human-readable profile name, used in logs and listings.
    pub name: String,

    /// Identities this profile binds to.
    pub aircraft: Vec<AircraftIdentity>,

    /// Base mapping document.
    #[serde(default)]
    pub mappings: MappingDocument,

    /// Variant overlay documents, keyed by variant string.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variants: HashMap<String, MappingDocument>,

    /// Ordered variant resolver rules; empty means no resolver.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_rules: Vec<VariantRule>,

    /// Simulator value samples the resolver needs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_samples: Vec<SubscribedValue>,

    /// Additional simulator values to monitor beyond those implied by the
    /// simulator-reports mappings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscribe_values: Vec<SubscribedValue>,

    /// Simulator commands watched for command-active reports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscribe_commands: Vec<String>,
}

impl AircraftProfile {
    /// Parse a profile document and eagerly compile every mapping layer so
    /// malformed profiles are rejected at load time, not at bind time.
    pub fn from_yaml(source: &str) -> Result<Self, ProfileError> {
        let profile: AircraftProfile = serde_yaml::from_str(source)?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<(), ProfileError> {
        if self.aircraft.is_empty() {
            return Err(ProfileError::NoIdentities {
                name: self.name.clone(),
            });
        }
        self.mappings.compile().map_err(|source| ProfileError::Mappings {
            name: self.name.clone(),
            source,
        })?;
        for (variant, document) in &self.variants {
            document
                .compile()
                .map_err(|source| ProfileError::VariantMappings {
                    name: self.name.clone(),
                    variant: variant.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Compiled base mapping layer.
    ///
    /// Profiles are validated at load time, so compilation cannot fail
    /// here; a defensive empty layer covers the impossible case.
    pub fn base_layer(&self) -> MappingLayer {
        self.mappings.compile().unwrap_or_default()
    }

    /// Compiled overlay layer for `variant`, if the profile declares one.
    pub fn variant_layer(&self, variant: &str) -> Option<MappingLayer> {
        self.variants
            .get(variant)
            .map(|document| document.compile().unwrap_or_default())
    }

    /// Whether this profile declares a variant resolver.
    pub fn has_variant_resolver(&self) -> bool {
        !self.variant_rules.is_empty()
    }

    /// Every simulator subscription this profile needs when bound with
    /// the given variant: mapping-implied values and commands, declared
    /// extras, and the resolver's samples.
    pub fn subscriptions(&self, variant: Option<&str>) -> SubscriptionSet {
        let mut set = SubscriptionSet::default();

        let mut documents = vec![&self.mappings];
        if let Some(overlay) = variant.and_then(|v| self.variants.get(v)) {
            documents.push(overlay);
        }
        for document in documents {
            set.extend(SubscriptionSet {
                values: document
                    .simulator_value_names()
                    .into_iter()
                    .map(ValueSubscription::number)
                    .collect(),
                commands: document.watched_command_names(),
            });
        }

        set.extend(SubscriptionSet {
            values: self
                .subscribe_values
                .iter()
                .chain(self.variant_samples.iter())
                .map(subscription_for)
                .collect(),
            commands: self.subscribe_commands.clone(),
        });

        set
    }

    /// Sample value names the variant resolver reads.
    pub fn sample_names(&self) -> Vec<String> {
        self.variant_samples.iter().map(|s| s.name.clone()).collect()
    }
}

fn subscription_for(declared: &SubscribedValue) -> ValueSubscription {
    match declared.r#type {
        SubscribedValueType::Number => ValueSubscription::number(declared.name.clone()),
        SubscribedValueType::Text => ValueSubscription::text(
            declared.name.clone(),
            declared.length.unwrap_or(DEFAULT_TEXT_LEN),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flight_deck_core::ValueKind;

    const PROFILE_DOC: &str = "
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
  simulator-reports:
    - report-type: simulator-value-change
      simulator-value-name: AirbusFBW/PanelBrightnessLevel
      action: set-device-value
      device-value-name: Backlight
";

    #[test]
    fn parses_and_validates_profile() {
        let profile = AircraftProfile::from_yaml(PROFILE_DOC).unwrap();
        assert_eq!(profile.name, "ToLiss A321neo");
        assert_eq!(profile.aircraft.len(), 1);
        assert!(profile.has_variant_resolver());
    }

    #[test]
    fn profile_without_identities_is_rejected() {
        let err = AircraftProfile::from_yaml("name: empty\naircraft: []\n").unwrap_err();
        assert!(matches!(err, ProfileError::NoIdentities { .. }));
    }

    #[test]
    fn malformed_mapping_is_rejected_at_load() {
        let err = AircraftProfile::from_yaml(
            "
name: broken
aircraft:
  - icao: A21N
    author: ToLiss
mappings:
  device-reports:
    - report-type: key-press
      key-name: LSK1L
      action: execute-simulator-command
",
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::Mappings { .. }));
    }

    #[test]
    fn malformed_variant_overlay_is_rejected_at_load() {
        let err = AircraftProfile::from_yaml(
            "
name: broken-variant
aircraft:
  - icao: A21N
    author: ToLiss
variants:
  272NX:
    simulator-reports:
      - report-type: simulator-value-change
        action: refresh-display
",
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::VariantMappings { .. }));
    }

    #[test]
    fn base_and_variant_layers_compile() {
        let profile = AircraftProfile::from_yaml(PROFILE_DOC).unwrap();
        assert_eq!(profile.base_layer().len(), 2);
        assert_eq!(profile.variant_layer("272NX").map(|l| l.len()), Some(1));
        assert!(profile.variant_layer("unknown").is_none());
    }

    #[test]
    fn subscriptions_cover_mappings_and_samples() {
        let profile = AircraftProfile::from_yaml(PROFILE_DOC).unwrap();
        let set = profile.subscriptions(None);

        let names: Vec<&str> = set.values.iter().map(|v| v.name.as_str()).collect();
        assert!(names.contains(&"AirbusFBW/PanelBrightnessLevel"));
        assert!(names.contains(&"AirbusFBW/EngineTypeIndex"));
        // Overlay values only when the variant is selected.
        assert!(!names.contains(&"AirbusFBW/OHPBrightnessLevel"));

        let with_variant = profile.subscriptions(Some("272NX"));
        let names: Vec<&str> = with_variant.values.iter().map(|v| v.name.as_str()).collect();
        assert!(names.contains(&"AirbusFBW/OHPBrightnessLevel"));
    }

    #[test]
    fn text_subscriptions_carry_length() {
        let profile = AircraftProfile::from_yaml(
            "
name: text-subs
aircraft:
  - icao: A21N
    author: ToLiss
subscribe-values:
  - name: sim/aircraft/view/acf_descrip
    type: text
    length: 260
",
        )
        .unwrap();
        let set = profile.subscriptions(None);
        assert_eq!(
            set.values[0].kind,
            ValueKind::Text { len: 260 }
        );
    }
}
