use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A search/replace rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerSpec {
    pub search_value: String,
    pub replace_value: String,
}

/// A compiled rule applied to resolved file names before path lookup.
#[derive(Debug, Clone)]
pub struct Transformer {
    search: Regex,
    replace_value: String,
}

impl Transformer {
    /// Compiles `search_value` as a regular expression; every match is replaced.
    ///
    /// `$&` in the replacement refers to the whole match, `$1`.. to groups.
    pub fn regex(search_value: &str, replace_value: &str) -> Result<Self, regex::Error> {
        let pattern = search_value.replacen("\\\\", "\\", 1);
        Ok(Self {
            search: Regex::new(&pattern)?,
            replace_value: replace_value.replace("$&", "${0}"),
        })
    }

    pub fn apply(&self, input: &str) -> String {
        self.search
            .replace_all(input, self.replace_value.as_str())
            .into_owned()
    }
}

/// Compiles every spec, dropping (with a warning) the ones whose pattern is invalid.
pub fn compile_transformers(specs: &[TransformerSpec]) -> Vec<Transformer> {
    specs
        .iter()
        .filter_map(
            |spec| match Transformer::regex(&spec.search_value, &spec.replace_value) {
                Ok(transformer) => Some(transformer),
                Err(err) => {
                    warn!("Bad replacer regex: {} ({err})", spec.search_value);
                    None
                }
            },
        )
        .collect()
}

pub fn apply_transformers(transformers: &[Transformer], file_name: &str) -> String {
    transformers
        .iter()
        .fold(file_name.to_string(), |acc, transformer| transformer.apply(&acc))
}

/// Reads transformer specs from their JSON form, e.g.
/// `[{"searchValue":"::","replaceValue":"/"}]`.
///
/// Unparseable input is not fatal; no transformers are applied in that case.
pub fn read_transformers(raw: &str) -> Vec<TransformerSpec> {
    if raw.trim().is_empty() {
        return vec![];
    }
    match serde_json::from_str::<Vec<TransformerSpec>>(raw) {
        Ok(specs) => specs,
        Err(err) => {
            info!("Transformers provided, but they couldn't be parsed. Falling back to defaults. ({err})");
            debug!("  Provided input: {raw}");
            vec![]
        }
    }
}
