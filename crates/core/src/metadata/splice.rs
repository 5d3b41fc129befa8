//! Applying a record's changes to the text it was loaded from.
//!
//! Re-serializing a whole record normalises every scalar (`versionName: 1.10`
//! comes back as `1.1`) and drops YAML comments. A loaded record only ever
//! gains builds and a new `Repo`, so those two edits are made on the original
//! text instead. Both functions return `Ok(None)` for layouts they do not
//! handle and leave the caller to re-render.

use super::app::{BUILDS_KEY, REPO_KEY};
use super::BuildEntry;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::value::RawValue;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::marker::PhantomData;

enum YamlLine<'a> {
    Key(&'a str),
    Nested,
    Trivia,
    Unsupported,
}

fn classify_yaml_line(line: &str) -> YamlLine<'_> {
    let content = line.trim_end();
    let trimmed = content.trim_start();

    if trimmed.is_empty() || trimmed.starts_with('#') {
        return YamlLine::Trivia;
    }
    if content.starts_with(' ') || content.starts_with("- ") || content == "-" {
        return YamlLine::Nested;
    }

    match content.split_once(':') {
        Some((key, rest)) if is_plain_key(key) && (rest.is_empty() || rest.starts_with(' ')) => {
            YamlLine::Key(key)
        }
        _ => YamlLine::Unsupported,
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_trivia(line: &str) -> bool {
    matches!(classify_yaml_line(line), YamlLine::Trivia)
}

/// Inline value after `key:` on a top-level line.
fn inline_value<'a>(line: &'a str, key: &str) -> &'a str {
    line.trim_end()
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or("")
        .trim()
}

fn render_yaml_field(key: &str, value: &str) -> Result<String, String> {
    let mut mapping = Mapping::new();
    mapping.insert(Value::from(key), Value::from(value));
    serde_yaml::to_string(&mapping).map_err(|e| e.to_string())
}

/// Block-style YAML with plain top-level keys.
///
/// `Repo` is rewritten on its own line (or added at the end) and new builds
/// go after the last item of the `Builds` sequence, at that sequence's indent.
pub(super) fn splice_yaml(
    text: &str,
    repo: Option<&str>,
    appended: &[BuildEntry],
) -> Result<Option<String>, String> {
    if repo.is_none() && appended.is_empty() {
        return Ok(Some(text.to_string()));
    }

    let mut source = text.to_string();
    if !source.ends_with('\n') {
        source.push('\n');
    }
    let lines: Vec<&str> = source.split_inclusive('\n').collect();

    // (key, first line, one past last line)
    let mut blocks: Vec<(&str, usize, usize)> = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        match classify_yaml_line(line) {
            YamlLine::Key(key) => {
                if let Some(last) = blocks.last_mut() {
                    last.2 = index;
                }
                blocks.push((key, index, lines.len()));
            }
            YamlLine::Nested if blocks.is_empty() => return Ok(None),
            YamlLine::Nested | YamlLine::Trivia => {}
            YamlLine::Unsupported => return Ok(None),
        }
    }
    let block = |key: &str| blocks.iter().find(|b| b.0 == key).map(|b| (b.1, b.2));

    let mut replaced: Option<(usize, String)> = None;
    let mut trailer = String::new();
    if let Some(repo) = repo {
        let rendered = render_yaml_field(REPO_KEY, repo)?;
        match block(REPO_KEY) {
            Some((start, end)) => {
                let inline = inline_value(lines[start], REPO_KEY);
                if inline.is_empty()
                    || inline.starts_with(['|', '>'])
                    || lines[start + 1..end].iter().any(|l| !is_trivia(l))
                {
                    return Ok(None);
                }
                replaced = Some((start, rendered));
            }
            None => trailer = rendered,
        }
    }

    let mut inserted: Option<(usize, String)> = None;
    if !appended.is_empty() {
        let Some((start, end)) = block(BUILDS_KEY) else {
            return Ok(None);
        };
        let inline = inline_value(lines[start], BUILDS_KEY);
        if !inline.is_empty() && !inline.starts_with('#') {
            return Ok(None);
        }

        let items: Vec<usize> = (start + 1..end).filter(|&i| !is_trivia(lines[i])).collect();
        let (Some(&first), Some(&last)) = (items.first(), items.last()) else {
            return Ok(None);
        };
        let item = lines[first].trim_end();
        if !item.trim_start().starts_with('-') {
            return Ok(None);
        }
        let indent = &item[..item.len() - item.trim_start().len()];

        let rendered = serde_yaml::to_string(appended).map_err(|e| e.to_string())?;
        let indented: String = rendered
            .split_inclusive('\n')
            .map(|l| {
                if l == "\n" {
                    l.to_string()
                } else {
                    format!("{}{}", indent, l)
                }
            })
            .collect();
        inserted = Some((last + 1, indented));
    }

    let mut out = String::with_capacity(source.len() + trailer.len());
    for (index, line) in lines.iter().enumerate() {
        if let Some((at, chunk)) = &inserted {
            if *at == index {
                out.push_str(chunk);
            }
        }
        match &replaced {
            Some((at, chunk)) if *at == index => out.push_str(chunk),
            _ => out.push_str(line),
        }
    }
    if let Some((at, chunk)) = &inserted {
        if *at == lines.len() {
            out.push_str(chunk);
        }
    }
    out.push_str(&trailer);

    Ok(Some(out))
}

/// Top-level members of a JSON object, each borrowed from the source text.
struct Members<'a>(Vec<(String, &'a RawValue)>);

impl<'de: 'a, 'a> Deserialize<'de> for Members<'a> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MembersVisitor<'a>(PhantomData<&'a ()>);

        impl<'de: 'a, 'a> Visitor<'de> for MembersVisitor<'a> {
            type Value = Members<'a>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut members = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, &'a RawValue>()? {
                    members.push((key, value));
                }
                Ok(Members(members))
            }
        }

        deserializer.deserialize_map(MembersVisitor(PhantomData))
    }
}

/// Byte range of `raw` inside `text`, which it was borrowed from.
fn span(text: &str, raw: &RawValue) -> (usize, usize) {
    let start = raw.get().as_ptr() as usize - text.as_ptr() as usize;
    (start, start + raw.get().len())
}

fn render_json_item(build: &BuildEntry, unit: &str, indent: &str) -> Result<String, String> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(unit.as_bytes()));
    build.serialize(&mut serializer).map_err(|e| e.to_string())?;

    let rendered = String::from_utf8(buffer).map_err(|e| e.to_string())?;
    Ok(rendered.replace('\n', &format!("\n{}", indent)))
}

/// Pretty-printed JSON with one build object per line group.
///
/// `Repo` must already exist; its string is replaced in place. New builds
/// follow the last element of `Builds`, indented like the existing ones.
pub(super) fn splice_json(
    text: &str,
    repo: Option<&str>,
    appended: &[BuildEntry],
) -> Result<Option<String>, String> {
    if repo.is_none() && appended.is_empty() {
        return Ok(Some(text.to_string()));
    }

    let Ok(Members(members)) = serde_json::from_str::<Members>(text) else {
        return Ok(None);
    };
    let member = |key: &str| members.iter().find(|(k, _)| k == key).map(|(_, raw)| *raw);

    let mut edits: Vec<(usize, usize, String)> = Vec::new();

    if let Some(repo) = repo {
        let Some(raw) = member(REPO_KEY) else {
            return Ok(None);
        };
        let (start, end) = span(text, raw);
        edits.push((start, end, serde_json::to_string(repo).map_err(|e| e.to_string())?));
    }

    if !appended.is_empty() {
        let Some(raw) = member(BUILDS_KEY) else {
            return Ok(None);
        };
        let Some(inner) = raw.get().strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
            return Ok(None);
        };
        let items = inner.trim_end();
        let leading = &inner[..inner.len() - inner.trim_start().len()];
        let Some((_, indent)) = leading.rsplit_once('\n') else {
            return Ok(None);
        };
        if items.trim().is_empty() || indent.is_empty() || indent.len() % 2 != 0 {
            return Ok(None);
        }
        let unit = &indent[..indent.len() / 2];

        let mut addition = String::new();
        for build in appended {
            addition.push_str(",\n");
            addition.push_str(indent);
            addition.push_str(&render_json_item(build, unit, indent)?);
        }
        let (start, _) = span(text, raw);
        let at = start + 1 + items.len();
        edits.push((at, at, addition));
    }

    edits.sort_by_key(|edit| edit.0);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        out.push_str(&text[cursor..start]);
        out.push_str(&replacement);
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    Ok(Some(out))
}
