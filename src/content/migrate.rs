//! Versioned payload migrations.
//!
//! Stored section payloads record the schema version they were written at.
//! Reads upgrade stale payloads step by step to the current version; each step
//! rewrites one version to the next. A payload claiming a version above the
//! current one is rejected.

use serde_json::{json, Value};

use super::registry::SectionKind;
use super::ContentError;

pub fn upgrade_to_current(
    kind: SectionKind,
    from_version: i32,
    mut content: Value,
) -> Result<(Value, i32), ContentError> {
    let current = kind.current_version();
    if from_version > current || from_version < 1 {
        return Err(ContentError::UnknownVersion {
            kind: kind.as_str().to_string(),
            version: from_version,
        });
    }

    let mut version = from_version;
    while version < current {
        content = step(kind, version, content)?;
        version += 1;
    }
    Ok((content, version))
}

fn step(kind: SectionKind, from: i32, content: Value) -> Result<Value, ContentError> {
    match (kind, from) {
        (SectionKind::Hero, 1) => Ok(hero_v1_to_v2(content)),
        (SectionKind::Contacts, 1) => Ok(contacts_v1_to_v2(content)),
        _ => Err(ContentError::UnknownVersion {
            kind: kind.as_str().to_string(),
            version: from,
        }),
    }
}

/// v1 stored the image as a bare URL string; v2 uses `{url, alt}`.
fn hero_v1_to_v2(mut content: Value) -> Value {
    if let Some(obj) = content.as_object_mut() {
        let image = obj.remove("image");
        let url = image.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        obj.insert("image".to_string(), json!({ "url": url, "alt": "" }));
    }
    content
}

/// v1 kept flat `phone` / `email` fields; v2 folds them into a `channels` list.
fn contacts_v1_to_v2(mut content: Value) -> Value {
    if let Some(obj) = content.as_object_mut() {
        let mut channels = Vec::new();
        if let Some(phone) = obj.remove("phone").and_then(|v| v.as_str().map(str::to_string)) {
            if !phone.is_empty() {
                channels.push(json!({ "kind": "phone", "value": phone }));
            }
        }
        if let Some(email) = obj.remove("email").and_then(|v| v.as_str().map(str::to_string)) {
            if !email.is_empty() {
                channels.push(json!({ "kind": "email", "value": email }));
            }
        }
        obj.insert("channels".to_string(), Value::Array(channels));
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hero_v1_image_becomes_object() {
        let v1 = json!({ "title": "t", "subtitle": "s", "image": "/img/hero.png" });
        let (v2, version) = upgrade_to_current(SectionKind::Hero, 1, v1).unwrap();
        assert_eq!(version, 2);
        assert_eq!(v2["image"]["url"], "/img/hero.png");
        assert_eq!(v2["image"]["alt"], "");
        // Result must satisfy the current shape
        SectionKind::Hero.validate(&v2).unwrap();
    }

    #[test]
    fn contacts_v1_folds_flat_fields_into_channels() {
        let v1 = json!({
            "heading": "Контакты",
            "address": "Москва",
            "phone": "+7 495 000-00-00",
            "email": "sales@protek.example"
        });
        let (v2, version) = upgrade_to_current(SectionKind::Contacts, 1, v1).unwrap();
        assert_eq!(version, 2);
        let channels = v2["channels"].as_array().unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0]["kind"], "phone");
        assert_eq!(channels[1]["value"], "sales@protek.example");
        SectionKind::Contacts.validate(&v2).unwrap();
    }

    #[test]
    fn current_version_is_a_no_op() {
        let content = SectionKind::Benefits.default_content();
        let (upgraded, version) =
            upgrade_to_current(SectionKind::Benefits, 1, content.clone()).unwrap();
        assert_eq!(version, 1);
        assert_eq!(upgraded, content);
    }

    #[test]
    fn future_version_is_rejected() {
        let err = upgrade_to_current(SectionKind::Hero, 3, json!({})).unwrap_err();
        assert!(matches!(err, ContentError::UnknownVersion { version: 3, .. }));
    }

    #[test]
    fn contacts_v1_without_contact_fields_gets_empty_channels() {
        let v1 = json!({ "heading": "h", "address": "a" });
        let (v2, _) = upgrade_to_current(SectionKind::Contacts, 1, v1).unwrap();
        assert!(v2["channels"].as_array().unwrap().is_empty());
    }
}
