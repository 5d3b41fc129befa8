//! A single entry of an app's `Builds` list.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Mapping;

/// One release build recipe.
///
/// The three fields this tool rewrites are typed; every other directive
/// (`subdir`, `gradle`, `prebuild`, ...) is carried verbatim in `directives`
/// in its original order. Cloning is a full deep copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildEntry {
    #[serde(rename = "versionName", deserialize_with = "scalar_string")]
    pub version_name: String,

    #[serde(rename = "versionCode", deserialize_with = "version_code")]
    pub version_code: u64,

    #[serde(
        default,
        deserialize_with = "optional_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub commit: Option<String>,

    #[serde(flatten)]
    pub directives: Mapping,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(u64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Str(s) => s,
        }
    }
}

// Unquoted YAML such as `versionName: 1.2` arrives as a number.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

fn optional_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Scalar>::deserialize(deserializer).map(|s| s.map(Scalar::into_string))
}

fn version_code<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(i) => Ok(i),
        Scalar::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid versionCode '{}'", s))),
        Scalar::Float(f) => Err(serde::de::Error::custom(format!(
            "invalid versionCode '{}'",
            f
        ))),
    }
}
