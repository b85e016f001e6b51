//! Render requests.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RenderError;

/// Theme selection for a [`Template`].
///
/// A template without a variant renders un-themed. With a variant, the theme
/// and all of its ancestors are searched, and `template_id` qualifies the
/// file names probed at each level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemedVariant {
    pub theme: String,
    pub template_id: Option<String>,
}

impl ThemedVariant {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            template_id: None,
        }
    }

    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }
}

/// A template to render: resource name, variables and optional variant.
///
/// ```rust
/// use serde_json::json;
/// use thematic::Template;
///
/// let template = Template::new("page/home")
///     .with_vars(json!({"title": "Home"}))
///     .themed("dark", Some("v2"));
///
/// assert_eq!(template.resource(), Some("page/home"));
/// assert_eq!(template.variant().unwrap().theme, "dark");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    resource: Option<String>,
    variables: Value,
    variant: Option<ThemedVariant>,
}

impl Template {
    /// A template for `resource` with no variables.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::default()
        }
    }

    /// Replaces the variables.
    pub fn with_vars(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    /// Replaces the variables with any serializable value.
    pub fn with_data<T: Serialize>(self, data: &T) -> Result<Self, RenderError> {
        Ok(self.with_vars(serde_json::to_value(data)?))
    }

    /// Sets a single variable. Non-object variables are replaced by an object.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if !self.variables.is_object() {
            self.variables = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.variables {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Renders under `theme` (and its ancestors), optionally qualified by
    /// `template_id`.
    pub fn themed(mut self, theme: impl Into<String>, template_id: Option<&str>) -> Self {
        let mut variant = ThemedVariant::new(theme);
        variant.template_id = template_id.map(str::to_string);
        self.variant = Some(variant);
        self
    }

    pub fn with_variant(mut self, variant: ThemedVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn variables(&self) -> &Value {
        &self.variables
    }

    pub fn variant(&self) -> Option<&ThemedVariant> {
        self.variant.as_ref()
    }
}

impl Default for Template {
    /// A template with no resource, which fails with
    /// [`RenderError::ResourceNotSet`] when rendered.
    fn default() -> Self {
        Self {
            resource: None,
            variables: Value::Object(Map::new()),
            variant: None,
        }
    }
}
