//! Declarative tool specifications.
//!
//! A `ToolSpec` names a tool, describes it for the model, and declares its
//! parameters with enough structure to validate arguments before dispatch and
//! to render a JSON Schema for provider advertisement.

use serde::Serialize;

/// Parameter value types supported by tool schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// UTF-8 string.
    String,
    /// Integer number.
    Integer,
    /// Floating-point number.
    Number,
    /// Boolean flag.
    Boolean,
}

impl ParamType {
    /// JSON Schema type keyword.
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    /// Checks a JSON value against this type.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

/// A single tool parameter declaration.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: &'static str,
    /// Value type.
    pub param_type: ParamType,
    /// Description shown to the model.
    pub description: &'static str,
    /// Whether the argument must be present.
    pub required: bool,
}

impl ParamSpec {
    /// Declares a required parameter.
    pub fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            description,
            required: true,
        }
    }

    /// Declares an optional parameter.
    pub fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            description,
            required: false,
        }
    }
}

/// A tool's name, description, and parameter declarations.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Unique tool name.
    pub name: &'static str,
    /// Description shown to the model.
    pub description: &'static str,
    /// Parameter declarations.
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    /// Creates a spec with no parameters.
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            params: Vec::new(),
        }
    }

    /// Adds a parameter declaration.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Validates an argument object against this spec.
    ///
    /// Returns a human-readable problem description on failure; `None` means
    /// the arguments are acceptable. Unknown keys are tolerated (models add
    /// them), missing required keys and type mismatches are not.
    pub fn check_arguments(&self, arguments: &serde_json::Value) -> Option<String> {
        let object = match arguments.as_object() {
            Some(map) => map,
            None => return Some("arguments must be a JSON object".to_string()),
        };

        for param in &self.params {
            match object.get(param.name) {
                Some(value) => {
                    if value.is_null() && !param.required {
                        continue;
                    }
                    if !param.param_type.matches(value) {
                        return Some(format!(
                            "parameter '{}' must be of type {}",
                            param.name,
                            param.param_type.json_type()
                        ));
                    }
                }
                None if param.required => {
                    return Some(format!("missing required parameter '{}'", param.name));
                }
                None => {}
            }
        }
        None
    }

    /// Renders the advertisement form sent to providers.
    pub fn advertise(&self) -> AdvertisedTool {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            properties.insert(
                param.name.to_string(),
                serde_json::json!({
                    "type": param.param_type.json_type(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(param.name.to_string());
            }
        }

        AdvertisedTool {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// The provider-facing form of a tool schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvertisedTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for the argument object.
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location_spec() -> ToolSpec {
        ToolSpec::new("search_location", "Geocode a place name")
            .with_param(ParamSpec::required(
                "query",
                ParamType::String,
                "Place name or address",
            ))
            .with_param(ParamSpec::optional(
                "city",
                ParamType::String,
                "City to bias toward",
            ))
    }

    #[test]
    fn check_arguments_accepts_valid_object() {
        let spec = location_spec();
        assert!(spec
            .check_arguments(&json!({"query": "Veldstraat", "city": "Gent"}))
            .is_none());
    }

    #[test]
    fn check_arguments_rejects_missing_required() {
        let spec = location_spec();
        let problem = spec.check_arguments(&json!({"city": "Gent"})).unwrap();
        assert!(problem.contains("query"));
    }

    #[test]
    fn check_arguments_rejects_wrong_type() {
        let spec = location_spec();
        let problem = spec.check_arguments(&json!({"query": 42})).unwrap();
        assert!(problem.contains("string"));
    }

    #[test]
    fn check_arguments_rejects_non_object() {
        let spec = location_spec();
        assert!(spec.check_arguments(&json!("just a string")).is_some());
    }

    #[test]
    fn check_arguments_tolerates_unknown_keys() {
        let spec = location_spec();
        assert!(spec
            .check_arguments(&json!({"query": "Veldstraat", "extra": true}))
            .is_none());
    }

    #[test]
    fn advertise_renders_json_schema() {
        let advertised = location_spec().advertise();
        assert_eq!(advertised.name, "search_location");
        assert_eq!(
            advertised.parameters["required"],
            serde_json::json!(["query"])
        );
        assert_eq!(
            advertised.parameters["properties"]["query"]["type"],
            "string"
        );
    }
}
