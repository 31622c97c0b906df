//! `application/x-www-form-urlencoded` decoding.
//!
//! Extended mode understands bracketed keys:
//! `user[name]=ann&tags[]=a&tags[]=b&pos[0]=x` decodes to
//! `{"user":{"name":"ann"},"tags":["a","b"],"pos":["x"]}`.
//! Repeated plain keys collect into an array in both modes.

use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::http::error::GatewayError;

/// Maximum number of `key=value` pairs accepted in one body.
pub const PARAMETER_LIMIT: usize = 1000;

/// Deepest bracket nesting honoured; anything deeper stays a literal key.
pub const MAX_DEPTH: usize = 5;

/// Highest explicit index (`a[20]`) still treated as an array slot.
pub const ARRAY_LIMIT: usize = 20;

/// Decode a form body into a JSON object.
pub fn decode(bytes: &[u8], extended: bool) -> Result<Value, GatewayError> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(bytes)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.len() > PARAMETER_LIMIT {
        return Err(GatewayError::TooManyParameters {
            limit: PARAMETER_LIMIT,
        });
    }

    let mut root = Value::Object(Map::new());
    for (key, value) in pairs {
        if key.is_empty() {
            continue;
        }
        let segments = if extended {
            split_key(&key)
        } else {
            vec![key]
        };
        insert(&mut root, &segments, Value::String(value));
    }

    if let Value::Object(map) = &mut root {
        map.values_mut().for_each(compact);
    }
    Ok(root)
}

/// Split `a[b][]` into `["a", "b", ""]`, honouring `MAX_DEPTH`.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];

    while let Some(stripped) = rest.strip_prefix('[') {
        if segments.len() > MAX_DEPTH {
            break;
        }
        let Some(close) = stripped.find(']') else {
            break;
        };
        segments.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(rest.to_string());
    }
    segments
}

fn array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok().filter(|i| *i <= ARRAY_LIMIT)
}

/// `[]` appends, so it needs an array; everything else starts as an object.
fn empty_container(next: &str) -> Value {
    if next.is_empty() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Arrays addressed by a non-index key become objects keyed by position.
fn to_object(value: &mut Value) {
    if let Value::Array(items) = value {
        let map = std::mem::take(items)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *value = Value::Object(map);
    }
}

fn combine(existing: &mut Value, value: Value) {
    match existing {
        Value::Array(items) => items.push(value),
        other => {
            let previous = std::mem::take(other);
            *other = Value::Array(vec![previous, value]);
        }
    }
}

fn insert(container: &mut Value, segments: &[String], value: Value) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };

    if container.is_array() && !segment.is_empty() && array_index(segment).is_none() {
        to_object(container);
    }

    match container {
        Value::Array(items) => {
            let slot = match array_index(segment) {
                Some(i) if i < items.len() => i,
                _ => {
                    items.push(Value::Null);
                    items.len() - 1
                }
            };
            place(&mut items[slot], rest, value);
        }
        Value::Object(map) => {
            let key = if segment.is_empty() {
                next_index(map).to_string()
            } else {
                segment.clone()
            };
            place(map.entry(key).or_insert(Value::Null), rest, value);
        }
        _ => {}
    }
}

/// Slot for a `[]` append: one past the highest index already present.
fn next_index(map: &Map<String, Value>) -> usize {
    map.keys()
        .filter(|k| !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|k| k.parse::<usize>().ok())
        .max()
        .map_or(map.len(), |max| max + 1)
}

fn place(slot: &mut Value, rest: &[String], value: Value) {
    let Some(next) = rest.first() else {
        if slot.is_null() {
            *slot = value;
        } else {
            combine(slot, value);
        }
        return;
    };

    match slot {
        Value::Null => *slot = empty_container(next),
        Value::Array(_) | Value::Object(_) => {}
        _ => {
            // `a=1&a[b]=2` keeps both: ["1", {"b": "2"}]
            let scalar = std::mem::take(slot);
            let mut nested = empty_container(next);
            insert(&mut nested, rest, value);
            *slot = Value::Array(vec![scalar, nested]);
            return;
        }
    }
    insert(slot, rest, value);
}

/// Turn objects whose keys are all small indices into arrays ordered by index.
fn compact(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(compact),
        Value::Object(map) => {
            map.values_mut().for_each(compact);
            let indexed: Option<Vec<usize>> = map.keys().map(|k| array_index(k)).collect();
            if let Some(mut indices) = indexed.filter(|i| !i.is_empty()) {
                indices.sort_unstable();
                let items = indices
                    .into_iter()
                    .filter_map(|i| map.remove(&i.to_string()))
                    .collect();
                *value = Value::Array(items);
            }
        }
        _ => {}
    }
}
