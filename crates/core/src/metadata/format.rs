use crate::error::MetadataError;
use serde_yaml::Mapping;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// On-disk encoding of a metadata record, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataFormat {
    Yaml,
    Json,
}

impl MetadataFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MetadataFormat::Yaml => "yml",
            MetadataFormat::Json => "json",
        }
    }

    pub fn parse(&self, path: &Path, text: &str) -> Result<Mapping, MetadataError> {
        let parsed = match self {
            MetadataFormat::Yaml => serde_yaml::from_str::<Mapping>(text).map_err(|e| e.to_string()),
            MetadataFormat::Json => serde_json::from_str::<Mapping>(text).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| MetadataError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn render(&self, path: &Path, document: &Mapping) -> Result<String, MetadataError> {
        let rendered = match self {
            MetadataFormat::Yaml => serde_yaml::to_string(document).map_err(|e| e.to_string()),
            MetadataFormat::Json => serde_json::to_string_pretty(document)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| e.to_string()),
        };

        rendered.map_err(|message| MetadataError::Serialize {
            path: path.to_path_buf(),
            message,
        })
    }
}

impl FromStr for MetadataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yml" | "yaml" => Ok(MetadataFormat::Yaml),
            "json" => Ok(MetadataFormat::Json),
            other => Err(format!(
                "Unknown metadata format: {}. Valid options: yml, json",
                other
            )),
        }
    }
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use yare::parameterized;

    #[parameterized(
        yml = { "metadata/org.example.app.yml", Some(MetadataFormat::Yaml) },
        yaml = { "metadata/org.example.app.yaml", Some(MetadataFormat::Yaml) },
        json = { "metadata/org.example.app.json", Some(MetadataFormat::Json) },
        upper_case = { "metadata/org.example.app.YML", Some(MetadataFormat::Yaml) },
        legacy_txt = { "metadata/org.example.app.txt", None },
        no_extension = { "metadata/org.example.app", None },
    )]
    fn test_from_path(path: &str, expected: Option<MetadataFormat>) {
        assert_eq!(MetadataFormat::from_path(&PathBuf::from(path)), expected);
    }

    #[test]
    fn test_yaml_keeps_key_order() {
        let path = PathBuf::from("a.yml");
        let text = "Categories:\n- System\nLicense: GPL-3.0-only\nAutoName: Example\n";

        let doc = MetadataFormat::Yaml.parse(&path, text).unwrap();
        let keys: Vec<&str> = doc.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["Categories", "License", "AutoName"]);

        assert_eq!(MetadataFormat::Yaml.render(&path, &doc).unwrap(), text);
    }

    #[test]
    fn test_json_render_ends_with_newline() {
        let path = PathBuf::from("a.json");
        let doc = MetadataFormat::Json
            .parse(&path, r#"{"License": "MIT", "Builds": []}"#)
            .unwrap();

        let rendered = MetadataFormat::Json.render(&path, &doc).unwrap();
        assert!(rendered.ends_with("}\n"));
        assert!(rendered.find("License").unwrap() < rendered.find("Builds").unwrap());
    }

    #[test]
    fn test_parse_error_names_file() {
        let path = PathBuf::from("metadata/broken.yml");
        let err = MetadataFormat::Yaml.parse(&path, "- just\n- a list\n").unwrap_err();

        assert!(matches!(err, MetadataError::Parse { .. }));
        assert!(err.to_string().contains("metadata/broken.yml"));
    }
}
