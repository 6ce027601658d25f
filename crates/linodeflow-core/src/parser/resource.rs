use super::first_string;
use crate::error::{ManifestError, Result};
use crate::model::{DEFAULT_PROVIDER, ResourceDecl};
use kdl::{KdlNode, KdlValue};
use linodeflow_cloud::{Operation, Timeouts, resource_key};
use serde_json::{Number, Value};
use std::time::Duration;

/// Attributes that always hold a list, even with a single argument
const LIST_ATTRIBUTES: [&str; 1] = ["authorized_keys"];

/// Parse a resource node (`volume "data" { ... }`)
pub fn parse_resource(node: &KdlNode) -> Result<ResourceDecl> {
    let resource_type = node.name().value();
    let name = first_string(node).ok_or_else(|| {
        ManifestError::InvalidConfig(format!("{} requires a name", resource_type))
    })?;

    let mut decl = ResourceDecl::new(resource_type, name, DEFAULT_PROVIDER);

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "provider" => {
                    decl.provider = first_string(child)
                        .ok_or_else(|| {
                            ManifestError::InvalidConfig(format!(
                                "{}: provider requires a name",
                                decl.key()
                            ))
                        })?
                        .to_string();
                }
                "timeouts" => decl.timeouts = parse_timeouts(child, &decl)?,
                attribute => {
                    if decl.attributes.contains_key(attribute)
                        || decl.references.contains_key(attribute)
                    {
                        return Err(ManifestError::Duplicate(format!(
                            "{}: attribute '{}'",
                            decl.key(),
                            attribute
                        )));
                    }
                    match parse_reference(child, &decl)? {
                        Some(target) => {
                            decl.references.insert(attribute.to_string(), target);
                        }
                        None => {
                            let value = parse_value(child, &decl)?;
                            decl.attributes.insert(attribute.to_string(), value);
                        }
                    }
                }
            }
        }
    }

    Ok(decl)
}

/// `linode_id ref="instance.web"` → `instance:web`
fn parse_reference(node: &KdlNode, decl: &ResourceDecl) -> Result<Option<String>> {
    let attribute = node.name().value();
    let mut target = None;

    for entry in node.entries() {
        match entry.name().map(|n| n.value()) {
            None => {}
            Some("ref") => {
                let raw = entry.value().as_string().ok_or_else(|| {
                    ManifestError::InvalidConfig(format!(
                        "{}: ref of '{}' must be a string",
                        decl.key(),
                        attribute
                    ))
                })?;
                let (resource_type, name) = raw
                    .split_once('.')
                    .filter(|(t, n)| !t.is_empty() && !n.is_empty())
                    .ok_or_else(|| ManifestError::InvalidReference {
                        resource: decl.key(),
                        attribute: attribute.to_string(),
                        target: raw.to_string(),
                        reason: "expected TYPE.NAME".to_string(),
                    })?;
                target = Some(resource_key(resource_type, name));
            }
            Some(other) => {
                return Err(ManifestError::InvalidConfig(format!(
                    "{}: unknown property '{}' on '{}'",
                    decl.key(),
                    other,
                    attribute
                )));
            }
        }
    }

    if target.is_some() && node.entries().iter().any(|e| e.name().is_none()) {
        return Err(ManifestError::InvalidConfig(format!(
            "{}: '{}' cannot have both a value and a ref",
            decl.key(),
            attribute
        )));
    }

    Ok(target)
}

fn parse_value(node: &KdlNode, decl: &ResourceDecl) -> Result<Value> {
    let attribute = node.name().value();
    let values = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| to_json(e.value(), decl, attribute))
        .collect::<Result<Vec<Value>>>()?;

    if LIST_ATTRIBUTES.contains(&attribute) || values.len() > 1 {
        return Ok(Value::Array(values));
    }

    values.into_iter().next().ok_or_else(|| {
        ManifestError::InvalidConfig(format!(
            "{}: attribute '{}' requires a value",
            decl.key(),
            attribute
        ))
    })
}

fn to_json(value: &KdlValue, decl: &ResourceDecl, attribute: &str) -> Result<Value> {
    let invalid = |reason: &str| {
        ManifestError::InvalidConfig(format!(
            "{}: attribute '{}' {}",
            decl.key(),
            attribute,
            reason
        ))
    };

    match value {
        KdlValue::String(s) => Ok(Value::String(s.clone())),
        KdlValue::Integer(i) => i64::try_from(*i)
            .map(Value::from)
            .map_err(|_| invalid("is out of range")),
        KdlValue::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| invalid("must be a finite number")),
        KdlValue::Bool(b) => Ok(Value::Bool(*b)),
        KdlValue::Null => Ok(Value::Null),
    }
}

/// `timeouts { create 1200; delete "5m" }`
fn parse_timeouts(node: &KdlNode, decl: &ResourceDecl) -> Result<Timeouts> {
    let mut timeouts = Timeouts::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let operation = match child.name().value() {
                "create" => Operation::Create,
                "update" => Operation::Update,
                "delete" => Operation::Delete,
                other => {
                    return Err(ManifestError::InvalidConfig(format!(
                        "{}: unknown timeout '{}'",
                        decl.key(),
                        other
                    )));
                }
            };
            let duration = child
                .entries()
                .first()
                .and_then(|e| parse_duration(e.value()))
                .ok_or_else(|| {
                    ManifestError::InvalidConfig(format!(
                        "{}: timeout '{}' must be seconds or a duration like \"20m\"",
                        decl.key(),
                        operation
                    ))
                })?;
            timeouts.set(operation, duration);
        }
    }

    Ok(timeouts)
}

/// Seconds as an integer, or a string with an `s`, `m` or `h` suffix
fn parse_duration(value: &KdlValue) -> Option<Duration> {
    if let Some(seconds) = value.as_integer() {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }

    let raw = value.as_string()?.trim();
    let (number, unit) = raw.split_at(raw.find(|c: char| !c.is_ascii_digit())?);
    let number: u64 = number.parse().ok()?;
    let seconds = match unit {
        "s" => Some(number),
        "m" => number.checked_mul(60),
        "h" => number.checked_mul(3600),
        _ => None,
    }?;
    Some(Duration::from_secs(seconds))
}
