use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parses `a.b[0].c` style paths. Empty input yields no segments.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    for ch in path.trim().chars() {
        match ch {
            '.' if !in_brackets => {
                push_segment(&mut segments, &current);
                current.clear();
            }
            '[' => {
                push_segment(&mut segments, &current);
                current.clear();
                in_brackets = true;
            }
            ']' => {
                push_segment(&mut segments, &current);
                current.clear();
                in_brackets = false;
            }
            _ => current.push(ch),
        }
    }
    push_segment(&mut segments, &current);
    segments
}

fn push_segment(segments: &mut Vec<PathSegment>, raw: &str) {
    let trimmed = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if trimmed.is_empty() {
        return;
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        segments.push(PathSegment::Index(index));
    } else {
        segments.push(PathSegment::Key(trimmed.to_string()));
    }
}

pub fn get_segments<'a>(target: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut current = target;
    for segment in segments {
        current = match segment {
            PathSegment::Key(key) => current.get(key.as_str())?,
            PathSegment::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current)
}

/// Reads a dotted path; `None` when any segment is missing.
pub fn get_path_value<'a>(target: &'a Value, path: &str) -> Option<&'a Value> {
    get_segments(target, &parse_path(path))
}

/// Like [`get_path_value`] but only yields non-empty strings.
pub fn get_path_str(target: &Value, path: &str) -> Option<String> {
    get_path_value(target, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
