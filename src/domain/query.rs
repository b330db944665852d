//! Structured queries and coercion of final answers into linked entities.
//!
//! A structured query names an entity class and label (plus an optional
//! location) and is rendered into a deterministic natural-language opening
//! turn. After the run, the model's free-form final answer is coerced back
//! into a list of linked entities when possible; unparseable answers keep
//! the raw text and set the coercion-failed flag instead of being dropped.

use serde::{Deserialize, Serialize};

/// Entity classes the service can link against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityClass {
    /// An elected or appointed mandate holder.
    Mandatary,
    /// A governing body (college, council, bureau).
    AdministrativeBody,
    /// An administrative unit (municipality, OCMW, district).
    AdministrativeUnit,
}

impl EntityClass {
    /// Human-readable class name used when rendering the opening turn.
    pub fn describe(&self) -> &'static str {
        match self {
            EntityClass::Mandatary => "mandatary (mandate holder)",
            EntityClass::AdministrativeBody => "administrative body",
            EntityClass::AdministrativeUnit => "administrative unit",
        }
    }
}

/// A validated structured entity-linking query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Class of entity to link.
    pub entity_class: EntityClass,
    /// Textual mention to resolve.
    pub entity_label: String,
    /// Optional location scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Structured query validation errors.
#[derive(Debug, thiserror::Error)]
pub enum QueryValidationError {
    /// The entity label is empty or whitespace.
    #[error("entity label must not be empty")]
    EmptyLabel,
}

impl StructuredQuery {
    /// Validates the query before rendering it into a conversation turn.
    pub fn validate(&self) -> Result<(), QueryValidationError> {
        if self.entity_label.trim().is_empty() {
            return Err(QueryValidationError::EmptyLabel);
        }
        Ok(())
    }

    /// Renders the query into a deterministic natural-language opening turn.
    ///
    /// The rendering is pure text assembly with a fixed order, so identical
    /// queries always seed identical transcripts.
    pub fn render(&self) -> String {
        let mut text = format!(
            "Find the canonical URI for the {} named \"{}\".",
            self.entity_class.describe(),
            self.entity_label.trim()
        );
        if let Some(location) = self.location.as_deref().filter(|l| !l.trim().is_empty()) {
            text.push_str(&format!(" Restrict the search to \"{}\".", location.trim()));
        }
        text.push_str(
            " Answer with a JSON array of objects with fields \
             \"uri\", \"label\", \"location\" and \"reasoning\".",
        );
        text
    }
}

/// One entity linked by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    /// Canonical URI of the matched entity.
    pub uri: String,
    /// Label of the matched entity.
    pub label: String,
    /// Location associated with the match, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Model's justification for the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Result of coercing a free-form final answer into structured form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredResult {
    /// Linked entities, empty when coercion failed.
    pub entities: Vec<LinkedEntity>,
    /// True when the answer could not be parsed into entities.
    pub coercion_failed: bool,
    /// The model's verbatim final answer.
    pub raw_answer: String,
}

impl StructuredResult {
    /// Coerces a final answer into a structured result.
    ///
    /// Extraction order: a ```json fenced block first, then the first
    /// balanced JSON array or object in the text. A single object parses as
    /// a one-element list. Anything else keeps the raw answer with the
    /// coercion-failed flag set.
    pub fn coerce(raw_answer: &str) -> Self {
        match extract_entities(raw_answer) {
            Some(entities) => Self {
                entities,
                coercion_failed: false,
                raw_answer: raw_answer.to_string(),
            },
            None => Self {
                entities: Vec::new(),
                coercion_failed: true,
                raw_answer: raw_answer.to_string(),
            },
        }
    }
}

fn extract_entities(text: &str) -> Option<Vec<LinkedEntity>> {
    if let Some(block) = extract_fenced_json(text) {
        if let Some(entities) = parse_entities(&block) {
            return Some(entities);
        }
    }
    if let Some(region) = extract_balanced(text) {
        if let Some(entities) = parse_entities(region) {
            return Some(entities);
        }
    }
    None
}

fn parse_entities(candidate: &str) -> Option<Vec<LinkedEntity>> {
    if let Ok(list) = serde_json::from_str::<Vec<LinkedEntity>>(candidate) {
        if !list.is_empty() {
            return Some(list);
        }
    }
    if let Ok(single) = serde_json::from_str::<LinkedEntity>(candidate) {
        return Some(vec![single]);
    }
    None
}

/// Returns the content of the first ```json (or bare ```) fenced block.
fn extract_fenced_json(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

/// Returns the first balanced `{...}` or `[...]` region, honoring strings.
fn extract_balanced(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b if !in_string && b == open => depth += 1,
            b if !in_string && b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_deterministic() {
        let query = StructuredQuery {
            entity_class: EntityClass::AdministrativeBody,
            entity_label: "Vast Bureau".to_string(),
            location: Some("Gent".to_string()),
        };
        assert_eq!(query.render(), query.render());
        assert!(query.render().contains("Vast Bureau"));
        assert!(query.render().contains("Gent"));
    }

    #[test]
    fn validate_rejects_blank_label() {
        let query = StructuredQuery {
            entity_class: EntityClass::Mandatary,
            entity_label: "   ".to_string(),
            location: None,
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn coerce_parses_fenced_json_array() {
        let answer = "Here is the match:\n```json\n[{\"uri\": \"http://data.lblod.info/id/besturen/1\", \"label\": \"Vast Bureau Gent\"}]\n```\nDone.";
        let result = StructuredResult::coerce(answer);
        assert!(!result.coercion_failed);
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].label, "Vast Bureau Gent");
    }

    #[test]
    fn coerce_parses_bare_object() {
        let answer = "The best match is {\"uri\": \"http://example.org/e1\", \"label\": \"Gent\", \"reasoning\": \"exact label match\"}.";
        let result = StructuredResult::coerce(answer);
        assert!(!result.coercion_failed);
        assert_eq!(result.entities[0].uri, "http://example.org/e1");
        assert_eq!(
            result.entities[0].reasoning.as_deref(),
            Some("exact label match")
        );
    }

    #[test]
    fn coerce_keeps_raw_answer_on_failure() {
        let answer = "I could not find a matching entity.";
        let result = StructuredResult::coerce(answer);
        assert!(result.coercion_failed);
        assert!(result.entities.is_empty());
        assert_eq!(result.raw_answer, answer);
    }

    #[test]
    fn coerce_ignores_braces_inside_strings() {
        let answer = "Match: {\"uri\": \"http://x/y\", \"label\": \"a {weird} name\"}";
        let result = StructuredResult::coerce(answer);
        assert!(!result.coercion_failed);
        assert_eq!(result.entities[0].label, "a {weird} name");
    }

    #[test]
    fn balanced_extraction_handles_nesting() {
        let text = "before [[{\"uri\": \"u\", \"label\": \"l\"}]] after";
        let region = extract_balanced(text).unwrap();
        assert!(region.starts_with("[["));
        assert!(region.ends_with("]]"));
    }

    proptest::proptest! {
        #[test]
        fn coercion_survives_surrounding_prose(
            prefix in "[a-zA-Z ,.]{0,40}",
            suffix in "[a-zA-Z ,.]{0,40}",
            uri in "https?://[a-z]{1,10}/[a-z0-9]{1,10}",
            label in "[a-zA-Z ]{1,20}",
        ) {
            let entity = LinkedEntity {
                uri,
                label,
                location: None,
                reasoning: None,
            };
            let answer = format!(
                "{prefix}{}{suffix}",
                serde_json::to_string(&entity).unwrap()
            );

            let result = StructuredResult::coerce(&answer);
            proptest::prop_assert!(!result.coercion_failed);
            proptest::prop_assert_eq!(&result.entities[0], &entity);
        }
    }
}
