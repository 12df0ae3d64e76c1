//! Per-version configuration of a definition

use crate::schema::SharedSchemaSource;

/// Additional printer column shown by `kubectl get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterColumn {
    /// Column header
    pub name: String,
    /// JSON path into the object; not validated here
    pub json_path: String,
    /// Display type (string, integer, number, boolean, date)
    pub type_: String,
    /// 0 shows the column in the standard view, higher only in wide output
    pub priority: i32,
    /// Optional description
    pub description: Option<String>,
    /// Optional format hint
    pub format: Option<String>,
}

impl PrinterColumn {
    /// A string column with priority 0
    pub fn new(name: impl Into<String>, json_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            json_path: json_path.into(),
            type_: "string".to_string(),
            priority: 0,
            description: None,
            format: None,
        }
    }

    /// Set the display type
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the format hint
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// JSON paths backing the scale subresource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalePaths {
    pub label_selector_path: String,
    pub spec_replicas_path: String,
    pub status_replicas_path: String,
}

/// One served and/or stored version of a definition
#[derive(Debug, Clone)]
pub struct VersionSpec {
    pub(crate) name: String,
    pub(crate) schema: SharedSchemaSource,
    pub(crate) served: bool,
    pub(crate) stored: bool,
    pub(crate) deprecation: Option<String>,
    pub(crate) scale: Option<ScalePaths>,
    pub(crate) status: bool,
    pub(crate) preserve_unknown_fields: bool,
    pub(crate) columns: Vec<PrinterColumn>,
}

impl VersionSpec {
    /// New version, served and stored
    pub fn new(name: impl Into<String>, schema: SharedSchemaSource) -> Self {
        Self {
            name: name.into(),
            schema,
            served: true,
            stored: true,
            deprecation: None,
            scale: None,
            status: false,
            preserve_unknown_fields: false,
            columns: Vec::new(),
        }
    }

    pub fn served(&mut self, served: bool) -> &mut Self {
        self.served = served;
        self
    }

    pub fn stored(&mut self, stored: bool) -> &mut Self {
        self.stored = stored;
        self
    }

    /// Mark the version deprecated with a warning returned to API clients
    pub fn deprecated(&mut self, warning: impl Into<String>) -> &mut Self {
        self.deprecation = Some(warning.into());
        self
    }

    /// Replace the representative object of this version
    pub fn schema(&mut self, schema: SharedSchemaSource) -> &mut Self {
        self.schema = schema;
        self
    }

    /// Enable the scale subresource
    pub fn scale(
        &mut self,
        label_selector_path: impl Into<String>,
        spec_replicas_path: impl Into<String>,
        status_replicas_path: impl Into<String>,
    ) -> &mut Self {
        self.scale = Some(ScalePaths {
            label_selector_path: label_selector_path.into(),
            spec_replicas_path: spec_replicas_path.into(),
            status_replicas_path: status_replicas_path.into(),
        });
        self
    }

    /// Enable the status subresource
    pub fn status(&mut self) -> &mut Self {
        self.status = true;
        self
    }

    /// Keep fields not described by the schema
    pub fn preserve_unknown_fields(&mut self) -> &mut Self {
        self.preserve_unknown_fields = true;
        self
    }

    /// Add a string printer column
    pub fn column(&mut self, name: impl Into<String>, json_path: impl Into<String>) -> &mut Self {
        self.columns.push(PrinterColumn::new(name, json_path));
        self
    }

    /// Add fully specified printer columns
    pub fn add_columns(&mut self, columns: impl IntoIterator<Item = PrinterColumn>) -> &mut Self {
        self.columns.extend(columns);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_served(&self) -> bool {
        self.served
    }

    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub fn columns(&self) -> &[PrinterColumn] {
        &self.columns
    }
}
