//! Function triggers: validation and semantic comparison.
//!
//! The API stores triggers as a tagged union keyed by `type`. Two trigger
//! lists are considered equal when they can be matched one-to-one, so the
//! order in which triggers are declared in YAML never causes a redeploy.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Every location an address trigger can watch.
pub const VALID_LOCATIONS: [&str; 10] = [
    "trace_to",
    "trace_from",
    "trace_input",
    "trace_output",
    "log_emitter",
    "log_topic",
    "log_data",
    "storage_key",
    "storage_value",
    "storage_address",
];

/// Storage slot, given either as a number or as a (usually hex) string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slot {
    Number(u64),
    Text(String),
}

impl Slot {
    /// Numeric value of the slot, reading text as decimal or `0x` hex.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => {
                let text = text.trim();
                match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16).ok(),
                    None => text.parse().ok(),
                }
            }
        }
    }

    /// Two text slots must match exactly; a number matches text with the same value.
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => self.as_number().is_some_and(|n| other.as_number() == Some(n)),
        }
    }
}

/// The storage variable watched by a storage access trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageVariable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_slot: Option<Slot>,
}

/// A function trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Trigger {
    #[serde(rename = "TRIGGER_TYPE_ADDRESS")]
    Address {
        #[serde(default)]
        address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locations: Option<Vec<String>>,
    },
    #[serde(rename = "TRIGGER_TYPE_EVENT")]
    Event {
        #[serde(default)]
        event: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emitter_address: Option<String>,
    },
    #[serde(rename = "TRIGGER_TYPE_FUNCTION")]
    Function {
        #[serde(default)]
        function: String,
    },
    #[serde(rename = "TRIGGER_TYPE_NEW_BLOCK")]
    NewBlock {},
    #[serde(rename = "TRIGGER_TYPE_NEW_CONTRACT")]
    NewContract {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deployer_address: Option<String>,
    },
    #[serde(rename = "TRIGGER_TYPE_STORAGE_ACCESS")]
    StorageAccess {
        #[serde(default)]
        storage_address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        follow_proxy: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<StorageVariable>,
    },
}

impl Trigger {
    /// The wire name of this trigger's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Address { .. } => "TRIGGER_TYPE_ADDRESS",
            Self::Event { .. } => "TRIGGER_TYPE_EVENT",
            Self::Function { .. } => "TRIGGER_TYPE_FUNCTION",
            Self::NewBlock {} => "TRIGGER_TYPE_NEW_BLOCK",
            Self::NewContract { .. } => "TRIGGER_TYPE_NEW_CONTRACT",
            Self::StorageAccess { .. } => "TRIGGER_TYPE_STORAGE_ACCESS",
        }
    }

    fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Comma-joined type names, as shown in preview tables.
pub fn trigger_types(triggers: &[Trigger]) -> String {
    triggers
        .iter()
        .map(Trigger::type_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check that a trigger carries the fields its type requires.
pub fn validate(trigger: &Trigger) -> Result<()> {
    match trigger {
        Trigger::Address { address, locations } => {
            let prefix = "Invalid Address Trigger:";
            if address.is_empty() {
                return Err(Error::Validation(format!("{prefix} Address is required.")));
            }
            for location in locations.iter().flatten() {
                if !VALID_LOCATIONS.contains(&location.as_str()) {
                    return Err(Error::Validation(format!(
                        "{prefix} Invalid location {location}."
                    )));
                }
            }
            Ok(())
        }
        Trigger::Event { event, .. } => {
            if event.is_empty() {
                return Err(Error::Validation(
                    "Invalid Event Trigger: Event signature is required.".to_string(),
                ));
            }
            Ok(())
        }
        Trigger::Function { function } => {
            if function.is_empty() {
                return Err(Error::Validation(
                    "Invalid Function Trigger: Function is required.".to_string(),
                ));
            }
            Ok(())
        }
        Trigger::NewBlock {} | Trigger::NewContract { .. } => Ok(()),
        Trigger::StorageAccess {
            storage_address,
            variable,
            ..
        } => {
            let prefix = "Invalid Storage Access Trigger:";
            if storage_address.is_empty() {
                return Err(Error::Validation(format!(
                    "{prefix} Storage address is required."
                )));
            }
            let Some(variable) = variable else {
                return Err(Error::Validation(format!("{prefix} Variable is required.")));
            };
            let has_name = variable.variable_name.as_deref().is_some_and(|n| !n.is_empty());
            if !has_name && variable.variable_slot.is_none() {
                return Err(Error::Validation(
                    "Invalid Storage Access Trigger Variable: Variable name or slot is required."
                        .to_string(),
                ));
            }
            Ok(())
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn opt_eq_ignore_case(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => eq_ignore_case(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn locations_equal(remote: Option<&Vec<String>>, spec: Option<&Vec<String>>) -> bool {
    let remote_set: HashSet<&str> = remote.into_iter().flatten().map(String::as_str).collect();
    let spec_set: HashSet<&str> = spec.into_iter().flatten().map(String::as_str).collect();

    if remote_set.len() != spec_set.len() {
        // Legacy: the API fills in every location when none were given.
        let all_locations = remote.is_some_and(|l| l.len() == VALID_LOCATIONS.len());
        return spec.is_none() && all_locations;
    }
    spec_set.iter().all(|location| remote_set.contains(location))
}

/// Whether a remote trigger and a spec trigger describe the same thing.
pub fn trigger_equals(remote: &Trigger, spec: &Trigger) -> bool {
    match (remote, spec) {
        (
            Trigger::Address {
                address: ra,
                locations: rl,
            },
            Trigger::Address {
                address: sa,
                locations: sl,
            },
        ) => eq_ignore_case(ra, sa) && locations_equal(rl.as_ref(), sl.as_ref()),
        (
            Trigger::Event {
                event: re,
                emitter_address: rem,
            },
            Trigger::Event {
                event: se,
                emitter_address: sem,
            },
        ) => re == se && opt_eq_ignore_case(rem.as_deref(), sem.as_deref()),
        (Trigger::Function { function: rf }, Trigger::Function { function: sf }) => rf == sf,
        (Trigger::NewBlock {}, Trigger::NewBlock {}) => true,
        (
            Trigger::NewContract {
                deployer_address: rd,
            },
            Trigger::NewContract {
                deployer_address: sd,
            },
        ) => opt_eq_ignore_case(rd.as_deref(), sd.as_deref()),
        (
            Trigger::StorageAccess {
                storage_address: ra,
                follow_proxy: rp,
                variable: rv,
            },
            Trigger::StorageAccess {
                storage_address: sa,
                follow_proxy: sp,
                variable: sv,
            },
        ) => eq_ignore_case(ra, sa) && rp == sp && variables_equal(rv.as_ref(), sv.as_ref()),
        _ => false,
    }
}

fn variables_equal(remote: Option<&StorageVariable>, spec: Option<&StorageVariable>) -> bool {
    let remote = remote.cloned().unwrap_or_default();
    let spec = spec.cloned().unwrap_or_default();
    remote.variable_name == spec.variable_name
        && match (&remote.variable_slot, &spec.variable_slot) {
            (Some(r), Some(s)) => r.loosely_equals(s),
            (r, s) => r == s,
        }
}

/// Whether two trigger lists match one-to-one, regardless of order.
///
/// Each spec trigger consumes the first still-unmatched remote trigger of the
/// same type that it equals.
pub fn trigger_set_equals(remote: &[Trigger], spec: &[Trigger]) -> bool {
    if remote.len() != spec.len() {
        return false;
    }

    let mut unmatched: Vec<&Trigger> = remote.iter().collect();
    let mut matches = 0;
    for spec_trigger in spec {
        let found = unmatched.iter().position(|remote_trigger| {
            remote_trigger.same_type(spec_trigger) && trigger_equals(remote_trigger, spec_trigger)
        });
        if let Some(index) = found {
            unmatched.remove(index);
            matches += 1;
        }
    }

    matches == spec.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(addr: &str, locations: Option<&[&str]>) -> Trigger {
        Trigger::Address {
            address: addr.to_string(),
            locations: locations.map(|l| l.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    fn event(sig: &str) -> Trigger {
        Trigger::Event {
            event: sig.to_string(),
            emitter_address: None,
        }
    }

    #[test]
    fn test_deserialize_tagged() {
        let yaml = "type: TRIGGER_TYPE_ADDRESS\naddress: '0xABC'\nlocations: [log_topic]\n";
        let trigger: Trigger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trigger, address("0xABC", Some(&["log_topic"])));

        let json = r#"{"type":"TRIGGER_TYPE_NEW_BLOCK"}"#;
        let trigger: Trigger = serde_json::from_str(json).unwrap();
        assert_eq!(trigger, Trigger::NewBlock {});
    }

    #[test]
    fn test_unknown_type_rejected_on_parse() {
        let yaml = "type: TRIGGER_TYPE_MAGIC\n";
        assert!(serde_yaml::from_str::<Trigger>(yaml).is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate(&address("0x1", None)).is_ok());
        assert!(validate(&address("0x1", Some(&["log_topic", "trace_to"]))).is_ok());

        let err = validate(&address("", None)).unwrap_err();
        assert!(err.to_string().contains("Address is required"));

        let err = validate(&address("0x1", Some(&["log_topic", "nowhere"]))).unwrap_err();
        assert!(err.to_string().contains("Invalid location nowhere"));
    }

    #[test]
    fn test_validate_event_and_function() {
        assert!(validate(&event("Transfer(address,address,uint256)")).is_ok());
        assert!(validate(&event("")).is_err());
        assert!(
            validate(&Trigger::Function {
                function: String::new()
            })
            .is_err()
        );
        assert!(validate(&Trigger::NewBlock {}).is_ok());
        assert!(
            validate(&Trigger::NewContract {
                deployer_address: None
            })
            .is_ok()
        );
    }

    #[test]
    fn test_validate_storage() {
        let missing_variable = Trigger::StorageAccess {
            storage_address: "0x1".to_string(),
            follow_proxy: None,
            variable: None,
        };
        assert!(
            validate(&missing_variable)
                .unwrap_err()
                .to_string()
                .contains("Variable is required")
        );

        let empty_variable = Trigger::StorageAccess {
            storage_address: "0x1".to_string(),
            follow_proxy: None,
            variable: Some(StorageVariable::default()),
        };
        assert!(
            validate(&empty_variable)
                .unwrap_err()
                .to_string()
                .contains("name or slot")
        );

        let by_slot = Trigger::StorageAccess {
            storage_address: "0x1".to_string(),
            follow_proxy: Some(true),
            variable: Some(StorageVariable {
                variable_name: None,
                variable_slot: Some(Slot::Number(3)),
            }),
        };
        assert!(validate(&by_slot).is_ok());
    }

    #[test]
    fn test_address_case_insensitive() {
        assert!(trigger_equals(
            &address("0xabc", Some(&["log_topic"])),
            &address("0xABC", Some(&["log_topic"]))
        ));
        assert!(!trigger_equals(
            &address("0xabd", None),
            &address("0xABC", None)
        ));
    }

    #[test]
    fn test_locations_compared_as_sets() {
        assert!(trigger_equals(
            &address("0x1", Some(&["log_topic", "trace_to"])),
            &address("0x1", Some(&["trace_to", "log_topic", "trace_to"]))
        ));
        assert!(!trigger_equals(
            &address("0x1", Some(&["log_topic", "storage_key"])),
            &address("0x1", Some(&["log_topic"]))
        ));
    }

    #[test]
    fn test_all_locations_legacy_rule() {
        let remote = address("0x1", Some(&VALID_LOCATIONS[..]));
        assert!(trigger_equals(&remote, &address("0x1", None)));

        // Only applies when the spec omits locations entirely.
        assert!(!trigger_equals(&remote, &address("0x1", Some(&["log_topic"]))));

        let partial = address("0x1", Some(&["log_topic", "storage_key"]));
        assert!(!trigger_equals(&partial, &address("0x1", None)));
    }

    #[test]
    fn test_type_mismatch_not_equal() {
        assert!(!trigger_equals(&Trigger::NewBlock {}, &event("X()")));
    }

    #[test]
    fn test_storage_equality() {
        let remote = Trigger::StorageAccess {
            storage_address: "0xAA".to_string(),
            follow_proxy: Some(true),
            variable: Some(StorageVariable {
                variable_name: Some("owner".to_string()),
                variable_slot: None,
            }),
        };
        let mut spec = remote.clone();
        if let Trigger::StorageAccess {
            storage_address, ..
        } = &mut spec
        {
            *storage_address = "0xaa".to_string();
        }
        assert!(trigger_equals(&remote, &spec));

        if let Trigger::StorageAccess { follow_proxy, .. } = &mut spec {
            *follow_proxy = Some(false);
        }
        assert!(!trigger_equals(&remote, &spec));
    }

    #[test]
    fn test_storage_slot_number_matches_text() {
        let by_slot = |slot: Slot| Trigger::StorageAccess {
            storage_address: "0xAA".to_string(),
            follow_proxy: None,
            variable: Some(StorageVariable {
                variable_name: None,
                variable_slot: Some(slot),
            }),
        };
        let number = by_slot(Slot::Number(3));
        assert!(trigger_equals(&number, &by_slot(Slot::Text("3".to_string()))));
        assert!(trigger_equals(&by_slot(Slot::Text("0x3".to_string())), &number));
        assert!(!trigger_equals(&number, &by_slot(Slot::Text("4".to_string()))));
        assert!(!trigger_equals(&number, &by_slot(Slot::Text("slot".to_string()))));
        assert!(!trigger_equals(
            &by_slot(Slot::Text("0x3".to_string())),
            &by_slot(Slot::Text("3".to_string()))
        ));
    }

    #[test]
    fn test_set_equals_ignores_order() {
        let a = vec![event("A()"), address("0x1", None), Trigger::NewBlock {}];
        let b = vec![Trigger::NewBlock {}, event("A()"), address("0x1", None)];
        assert!(trigger_set_equals(&a, &b));
        assert!(trigger_set_equals(&b, &a));
    }

    #[test]
    fn test_set_equals_length_mismatch() {
        let a = vec![event("A()")];
        let b = vec![event("A()"), event("A()")];
        assert!(!trigger_set_equals(&a, &b));
    }

    #[test]
    fn test_set_equals_duplicates_consumed_once() {
        let remote = vec![event("A()"), event("B()")];
        let spec = vec![event("A()"), event("A()")];
        assert!(!trigger_set_equals(&remote, &spec));
        assert!(!trigger_set_equals(&spec, &remote));
    }

    #[test]
    fn test_set_equals_symmetric() {
        let a = vec![address("0xAB", Some(&["log_topic"])), event("A()")];
        let b = vec![event("A()"), address("0xab", Some(&["log_topic"]))];
        assert_eq!(trigger_set_equals(&a, &b), trigger_set_equals(&b, &a));
    }

    #[test]
    fn test_set_changed_when_superset_of_locations() {
        let remote = vec![address("0xabc", Some(&["log_topic", "storage_key"]))];
        let spec = vec![address("0xABC", Some(&["log_topic"]))];
        assert!(!trigger_set_equals(&remote, &spec));
    }

    #[test]
    fn test_trigger_types() {
        let triggers = vec![Trigger::NewBlock {}, event("A()")];
        assert_eq!(
            trigger_types(&triggers),
            "TRIGGER_TYPE_NEW_BLOCK, TRIGGER_TYPE_EVENT"
        );
    }
}
