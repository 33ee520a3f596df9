use serde::de::DeserializeOwned;

/// Non-fatal findings from loading a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys that were present but not recognized, as dotted TOML paths
    /// (`recipe.extra_rules[0].sorce`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty()
    }
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(toml_path(path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

/// Render a `serde_ignored` path the way it is written in TOML.
fn toml_path(path: serde_ignored::Path) -> String {
    let raw = path.to_string();
    let mut out = String::new();
    for segment in raw.trim_start_matches('.').split('.') {
        let is_index = !out.is_empty() && !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());
        if is_index {
            out.push('[');
            out.push_str(segment);
            out.push(']');
            continue;
        }
        if !out.is_empty() {
            out.push('.');
        }
        out.push_str(segment);
    }
    out
}
