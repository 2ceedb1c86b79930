//! Layered configuration: built-in defaults < test sheet < user.
//!
//! Layers are merged key-wise on the YAML value tree before the typed
//! [`Config`] is deserialized, so a layer only needs the keys it overrides.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::ConfigResult;
use crate::schema::Config;
use crate::validate::validate_config;

/// Key that discriminates tagged variants such as the filter kind.
const TAG_KEY: &str = "type";

/// Merge `overlay` into `base`.
///
/// Mappings merge recursively; anything else in `overlay` replaces `base`.
/// A mapping whose variant tag changes is replaced whole so fields of the old
/// variant do not leak into the new one.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            if tag_changes(base_map, &overlay_map) {
                *base_map = overlay_map;
                return;
            }
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn tag_changes(base: &Mapping, overlay: &Mapping) -> bool {
    let key = Value::String(TAG_KEY.to_string());
    match (base.get(&key), overlay.get(&key)) {
        (Some(old), Some(new)) => old != new,
        _ => false,
    }
}

/// Resolve layers (lowest precedence first) over the defaults and validate.
pub fn resolve_layers<I>(layers: I) -> ConfigResult<Config>
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = serde_yaml::to_value(Config::default())?;
    for (index, layer) in layers.into_iter().enumerate() {
        if layer.is_null() {
            continue;
        }
        debug!(layer = index, "merging configuration layer");
        merge_values(&mut merged, layer);
    }
    let config: Config = serde_yaml::from_value(merged)?;
    validate_config(&config)?;
    Ok(config)
}

/// Resolve from YAML texts (lowest precedence first).
pub fn resolve_yaml_layers(texts: &[&str]) -> ConfigResult<Config> {
    let layers = texts
        .iter()
        .map(|text| serde_yaml::from_str::<Value>(text))
        .collect::<Result<Vec<_>, _>>()?;
    resolve_layers(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_compliance::ChannelFamily;
    use gc_signal::FilterKind;

    #[test]
    fn empty_layers_give_defaults() {
        let config = resolve_yaml_layers(&[]).unwrap();
        assert_eq!(config, Config::default());
        let config = resolve_yaml_layers(&["", "{}"]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn later_layers_win() {
        let sheet = "signal:\n  filter:\n    cutoff_hz: 10.0\n  common_step_s: 0.002\n";
        let user = "signal:\n  filter:\n    cutoff_hz: 12.5\n";
        let config = resolve_yaml_layers(&[sheet, user]).unwrap();
        assert_eq!(config.signal.filter.cutoff_hz, 12.5);
        assert_eq!(config.signal.common_step_s, Some(0.002));
        assert!(config.signal.filter.enabled);
    }

    #[test]
    fn threshold_override_keeps_siblings() {
        let user = "thresholds:\n  simulation:\n    voltage:\n      during:\n        mxe: 0.12\n";
        let config = resolve_yaml_layers(&[user]).unwrap();
        let voltage = &config.thresholds.simulation[&ChannelFamily::Voltage];
        assert_eq!(voltage.during.mxe, Some(0.12));
        assert_eq!(voltage.during.me, Some(0.05));
        assert_eq!(voltage.before.mxe, Some(0.05));
    }

    #[test]
    fn null_threshold_disables_check() {
        let user = "thresholds:\n  simulation:\n    active_power:\n      \
                    after:\n        me: null\n";
        let config = resolve_yaml_layers(&[user]).unwrap();
        assert_eq!(
            config.thresholds.simulation[&ChannelFamily::ActivePower].after.me,
            None
        );
    }

    #[test]
    fn filter_variant_switch_replaces_fields() {
        let sheet = "signal:\n  filter:\n    kind:\n      type: chebyshev1\n      ripple_db: 0.5\n";
        let user = "signal:\n  filter:\n    kind:\n      type: bessel\n";
        let config = resolve_yaml_layers(&[sheet, user]).unwrap();
        assert_eq!(config.signal.filter.kind, FilterKind::Bessel);
    }

    #[test]
    fn unknown_filter_or_padding_fails_at_parse_time() {
        let bad_kind = "signal:\n  filter:\n    kind:\n      type: elliptic\n";
        assert!(resolve_yaml_layers(&[bad_kind]).is_err());
        let bad_padding = "signal:\n  filter:\n    padding: mirror\n";
        assert!(resolve_yaml_layers(&[bad_padding]).is_err());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        assert!(resolve_yaml_layers(&["filters: {}\n"]).is_err());
    }

    #[test]
    fn misspelled_nested_keys_are_rejected() {
        for layer in [
            "signal:\n  filter:\n    cuttoff_hz: 5.0\n",
            "signal:\n  max_sampling_hz: 1000.0\n",
            "windows:\n  bolted:\n    inceptoin_s: 0.3\n",
            "thresholds:\n  simulation:\n    voltage:\n      durng:\n        mxe: 0.2\n",
            "thresholds:\n  simulation:\n    voltage:\n      during:\n        max: 0.2\n",
            "diagnostics:\n  dump_curve: true\n",
            "batch:\n  worker: 2\n",
        ] {
            assert!(
                matches!(resolve_yaml_layers(&[layer]), Err(crate::ConfigError::Yaml(_))),
                "accepted {layer:?}"
            );
        }
    }

    #[test]
    fn invalid_values_fail_validation() {
        let user = "windows:\n  bolted:\n    inception_s: -1.0\n";
        assert!(matches!(
            resolve_yaml_layers(&[user]),
            Err(crate::ConfigError::Validation(_))
        ));
    }
}
