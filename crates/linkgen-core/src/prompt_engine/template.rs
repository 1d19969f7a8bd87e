//! Template substitution engine.
//!
//! Closed syntax: `{variable_name}` for scalars, `{[array_name]}` for a
//! bullet-rendered list. No conditionals, no nesting, no escaping — a
//! literal `{` is not supported.

use std::collections::HashMap;

use crate::domain::PromptType;
use crate::error::TemplateError;

/// An extracted placeholder: scalar or array, in first-seen order with
/// duplicates removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Scalar(String),
    Array(String),
}

/// Extract the ordered, deduplicated set of placeholders referenced by a
/// template.
pub fn extract_variables(template: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i..].find('}') {
                let inner = &template[i + 1..i + end];
                let placeholder = if let Some(array_name) = inner.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                    Placeholder::Array(array_name.to_string())
                } else {
                    Placeholder::Scalar(inner.to_string())
                };
                if !found.contains(&placeholder) {
                    found.push(placeholder);
                }
                i += end + 1;
                continue;
            }
        }
        i += 1;
    }
    found
}

/// Validate a template against the required-variable rules for its type.
///
/// Ideas templates must reference at least `{ideas}` and `{name}`. Drafts
/// templates must not reference topic-only variables but must reference at
/// least one of `{idea}`, `{user_context}`.
pub fn validate_prompt_template(template: &str, prompt_type: PromptType) -> Result<(), TemplateError> {
    let vars = extract_variables(template);
    let has_scalar = |name: &str| vars.iter().any(|p| matches!(p, Placeholder::Scalar(n) if n == name));

    match prompt_type {
        PromptType::Ideas => {
            let mut missing = Vec::new();
            if !has_scalar("ideas") {
                missing.push("ideas".to_string());
            }
            if !has_scalar("name") {
                missing.push("name".to_string());
            }
            if !missing.is_empty() {
                return Err(TemplateError::MissingRequiredVariables {
                    prompt_type: "ideas".to_string(),
                    missing,
                });
            }
        }
        PromptType::Drafts => {
            const TOPIC_ONLY: &[&str] = &["topic_name", "topic_description", "related_topics"];
            for name in TOPIC_ONLY {
                if has_scalar(name) || vars.contains(&Placeholder::Array(name.to_string())) {
                    return Err(TemplateError::MissingRequiredVariables {
                        prompt_type: "drafts".to_string(),
                        missing: vec![format!("must not reference topic-only variable {name}")],
                    });
                }
            }
            if !has_scalar("idea") && !has_scalar("user_context") {
                return Err(TemplateError::MissingRequiredVariables {
                    prompt_type: "drafts".to_string(),
                    missing: vec!["idea".to_string(), "user_context".to_string()],
                });
            }
        }
    }
    Ok(())
}

/// Substitute placeholders in `template` using `scalars` and `arrays`.
///
/// In strict mode, an unbound scalar raises `TemplateError::Unbound`; in
/// lenient mode it is left in place as literal text. Array placeholders
/// render as a newline-joined, bullet-prefixed list; an empty or missing
/// array renders as an empty string in both modes.
pub fn substitute(
    template: &str,
    scalars: &HashMap<String, String>,
    arrays: &HashMap<String, Vec<String>>,
    strict: bool,
) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i..].find('}') {
                let inner = &template[i + 1..i + end];
                if let Some(array_name) = inner.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                    if let Some(items) = arrays.get(array_name) {
                        output.push_str(&render_array(items));
                    }
                    i += end + 1;
                    continue;
                }
                if let Some(value) = scalars.get(inner) {
                    output.push_str(value);
                    i += end + 1;
                    continue;
                }
                if strict {
                    return Err(TemplateError::Unbound(inner.to_string()));
                }
                output.push_str(&template[i..=i + end]);
                i += end + 1;
                continue;
            }
        }
        output.push(bytes[i] as char);
        i += 1;
    }
    Ok(output)
}

fn render_array(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    items.iter().map(|item| format!("- {item}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_scalar_and_array_placeholders_in_order_deduped() {
        let vars = extract_variables("{name} likes {[keywords]} and {name} again and {[keywords]}");
        assert_eq!(
            vars,
            vec![
                Placeholder::Scalar("name".to_string()),
                Placeholder::Array("keywords".to_string()),
            ]
        );
    }

    #[test]
    fn validates_ideas_template_requires_ideas_and_name() {
        assert!(validate_prompt_template("Generate {ideas} for {name}", PromptType::Ideas).is_ok());
        let err = validate_prompt_template("Generate content", PromptType::Ideas).unwrap_err();
        assert!(matches!(err, TemplateError::MissingRequiredVariables { .. }));
    }

    #[test]
    fn validates_drafts_template_requires_idea_or_user_context() {
        assert!(validate_prompt_template("Write about {idea}", PromptType::Drafts).is_ok());
        assert!(validate_prompt_template("Write for {user_context}", PromptType::Drafts).is_ok());
        assert!(validate_prompt_template("Write something generic", PromptType::Drafts).is_err());
    }

    #[test]
    fn validates_drafts_template_rejects_topic_only_variables() {
        let err = validate_prompt_template("{idea} about {topic_name}", PromptType::Drafts).unwrap_err();
        assert!(matches!(err, TemplateError::MissingRequiredVariables { .. }));
    }

    #[test]
    fn substitute_scalar_and_array() {
        let mut scalars = HashMap::new();
        scalars.insert("name".to_string(), "Ada".to_string());
        let mut arrays = HashMap::new();
        arrays.insert("keywords".to_string(), vec!["rust".to_string(), "async".to_string()]);

        let result = substitute("Hi {name}, keywords:\n{[keywords]}", &scalars, &arrays, true).unwrap();
        assert_eq!(result, "Hi Ada, keywords:\n- rust\n- async");
    }

    #[test]
    fn substitute_empty_array_renders_empty_string() {
        let scalars = HashMap::new();
        let mut arrays = HashMap::new();
        arrays.insert("keywords".to_string(), vec![]);
        let result = substitute("before[{[keywords]}]after", &scalars, &arrays, true).unwrap();
        assert_eq!(result, "before[]after");
    }

    #[test]
    fn strict_mode_rejects_unbound_scalar() {
        let result = substitute("Hi {name}", &HashMap::new(), &HashMap::new(), true);
        assert!(matches!(result, Err(TemplateError::Unbound(_))));
    }

    #[test]
    fn lenient_mode_leaves_unbound_scalar_literal() {
        let result = substitute("Hi {name}", &HashMap::new(), &HashMap::new(), false).unwrap();
        assert_eq!(result, "Hi {name}");
    }
}
